//! Agreement between cluster labels and the ground-truth diagnosis

use crate::clustering::Assignments;
use crate::error::{PimaError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of positions where the label equals the diagnosis.
///
/// Labels are compared as-is: cluster `1` only agrees with a positive
/// diagnosis, and clusters above `1` never agree.
pub fn agreement(labels: &Array1<usize>, diagnoses: &Array1<usize>) -> Result<usize> {
    check_lengths(labels, diagnoses)?;
    Ok(labels
        .iter()
        .zip(diagnoses.iter())
        .filter(|(l, d)| l == d)
        .count())
}

/// Agreement after mapping every cluster to its majority diagnosis.
///
/// Ties go to the smaller diagnosis value.
pub fn aligned_agreement(labels: &Array1<usize>, diagnoses: &Array1<usize>) -> Result<usize> {
    check_lengths(labels, diagnoses)?;

    let mut counts: HashMap<usize, HashMap<usize, usize>> = HashMap::new();
    for (&l, &d) in labels.iter().zip(diagnoses.iter()) {
        *counts.entry(l).or_default().entry(d).or_default() += 1;
    }

    Ok(counts
        .values()
        .map(|per_diag| {
            per_diag
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(_, &n)| n)
                .unwrap_or(0)
        })
        .sum())
}

fn check_lengths(labels: &Array1<usize>, diagnoses: &Array1<usize>) -> Result<()> {
    if labels.len() != diagnoses.len() {
        return Err(PimaError::ShapeError {
            expected: format!("{} labels", diagnoses.len()),
            actual: format!("{} labels", labels.len()),
        });
    }
    Ok(())
}

/// A count per dataset split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub training: usize,
    pub test: usize,
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.training, self.test)
    }
}

/// Raw and majority-aligned agreement of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub agreement: SetScore,
    pub aligned: SetScore,
    pub sizes: SetScore,
}

impl Evaluation {
    pub fn score(assignments: &Assignments, diagnoses: [&Array1<usize>; 2]) -> Result<Self> {
        let [train_diag, test_diag] = diagnoses;
        Ok(Self {
            agreement: SetScore {
                training: agreement(&assignments.training, train_diag)?,
                test: agreement(&assignments.test, test_diag)?,
            },
            aligned: SetScore {
                training: aligned_agreement(&assignments.training, train_diag)?,
                test: aligned_agreement(&assignments.test, test_diag)?,
            },
            sizes: SetScore {
                training: train_diag.len(),
                test: test_diag.len(),
            },
        })
    }

    /// Aligned agreement as a fraction of each split
    pub fn aligned_accuracy(&self) -> (f64, f64) {
        (
            ratio(self.aligned.training, self.sizes.training),
            ratio(self.aligned.test, self.sizes.test),
        )
    }
}

fn ratio(n: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        n as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_agreement_raw_labels() {
        let labels = array![0, 1, 1, 2];
        let diag = array![0, 1, 0, 0];
        assert_eq!(agreement(&labels, &diag).unwrap(), 2);
    }

    #[test]
    fn test_agreement_swapped_clusters() {
        let labels = array![1, 1, 0, 0];
        let diag = array![0, 0, 1, 1];
        assert_eq!(agreement(&labels, &diag).unwrap(), 0);
        assert_eq!(aligned_agreement(&labels, &diag).unwrap(), 4);
    }

    #[test]
    fn test_aligned_three_clusters() {
        let labels = array![0, 0, 1, 1, 2, 2, 2];
        let diag = array![0, 1, 1, 1, 0, 0, 1];
        // per-cluster majority counts: 1 (tie) + 2 + 2
        assert_eq!(aligned_agreement(&labels, &diag).unwrap(), 5);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(agreement(&array![0, 1], &array![0]).is_err());
    }

    #[test]
    fn test_set_score_display() {
        let s = SetScore { training: 120, test: 210 };
        assert_eq!(s.to_string(), "[120, 210]");
    }

    #[test]
    fn test_evaluation_score() {
        let a = Assignments::new(array![0, 1, 1], array![1, 0]);
        let e = Evaluation::score(&a, [&array![0, 1, 0], &array![0, 1]]).unwrap();
        assert_eq!(e.agreement, SetScore { training: 2, test: 0 });
        assert_eq!(e.aligned, SetScore { training: 2, test: 2 });
        assert_eq!(e.aligned_accuracy().1, 1.0);
    }
}
