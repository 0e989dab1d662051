//! Crisp and fuzzy clustering of the training set, with labels carried
//! over to the test set.

pub mod fuzzy;
pub mod kmeans;

pub use fuzzy::{harden, partition_coefficient, FuzzyCMeans, FuzzyFit, FuzzyPrediction};
pub use kmeans::KMeans;

use crate::error::{PimaError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cluster labels for the training and test sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignments {
    pub training: Array1<usize>,
    pub test: Array1<usize>,
}

impl Assignments {
    pub fn new(training: Array1<usize>, test: Array1<usize>) -> Self {
        Self { training, test }
    }

    /// (training, test) in that order
    pub fn sets(&self) -> [&Array1<usize>; 2] {
        [&self.training, &self.test]
    }
}

/// Algorithm-specific quality measure of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitQuality {
    /// k-means sum of squared distances
    Inertia { value: f64, n_iter: usize },
    /// fuzzy partition coefficient of training and test memberships
    PartitionCoefficient { training: f64, test: f64, n_iter: usize },
}

/// Numeric knobs shared by both algorithms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringParams {
    pub random_state: u64,
    pub fuzzy_error: f64,
    pub fuzzy_max_iter: usize,
    pub kmeans_n_init: usize,
    pub kmeans_max_iter: usize,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            random_state: 42,
            fuzzy_error: 0.005,
            fuzzy_max_iter: 1000,
            kmeans_n_init: 10,
            kmeans_max_iter: 300,
        }
    }
}

/// Clustering algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Algorithm {
    Fuzzy { m: f64 },
    Crisp,
}

impl Algorithm {
    /// Function-style name used in chart titles
    pub fn function_name(&self) -> &'static str {
        match self {
            Algorithm::Fuzzy { .. } => "perform_fuzzy_clustering",
            Algorithm::Crisp => "perform_crisp_clustering",
        }
    }

    /// Chart title for a run with `clusters` clusters
    pub fn title(&self, clusters: usize) -> String {
        let mut title = format!("Clusters: {}, Function: {}", clusters, self.function_name());
        if let Algorithm::Fuzzy { m } = self {
            title.push_str(&format!(", m: {}", m));
        }
        title
    }

    /// Fit on `training`, label both sets
    pub fn run(
        &self,
        training: &Array2<f64>,
        test: &Array2<f64>,
        clusters: usize,
        params: &ClusteringParams,
    ) -> Result<(Assignments, FitQuality)> {
        match *self {
            Algorithm::Fuzzy { m } => {
                let mut model = FuzzyCMeans::new(clusters, m)
                    .with_error(params.fuzzy_error)
                    .with_max_iter(params.fuzzy_max_iter)
                    .with_random_state(params.random_state);
                model.fit(training)?;
                let prediction = model.predict(test)?;
                let fit = model.fitted().ok_or(PimaError::ModelNotFitted)?;
                let quality = FitQuality::PartitionCoefficient {
                    training: fit.fpc,
                    test: prediction.fpc,
                    n_iter: fit.n_iter,
                };
                Ok((
                    Assignments::new(harden(&fit.membership), prediction.labels()),
                    quality,
                ))
            }
            Algorithm::Crisp => {
                let mut model = KMeans::new(clusters)
                    .with_n_init(params.kmeans_n_init)
                    .with_max_iter(params.kmeans_max_iter)
                    .with_random_state(params.random_state);
                model.fit(training)?;
                let test_labels = model.predict(test)?;
                let training_labels = model
                    .labels()
                    .cloned()
                    .ok_or(PimaError::ModelNotFitted)?;
                let quality = FitQuality::Inertia {
                    value: model.inertia.unwrap_or_default(),
                    n_iter: model.n_iter,
                };
                Ok((Assignments::new(training_labels, test_labels), quality))
            }
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Fuzzy { m } => write!(f, "fuzzy c-means (m = {})", m),
            Algorithm::Crisp => write!(f, "k-means"),
        }
    }
}

/// k-means on `training`, labels for both sets
pub fn perform_crisp_clustering(
    training: &Array2<f64>,
    test: &Array2<f64>,
    clusters: usize,
) -> Result<Assignments> {
    Algorithm::Crisp
        .run(training, test, clusters, &ClusteringParams::default())
        .map(|(assignments, _)| assignments)
}

/// Fuzzy c-means on `training` with fuzziness `m`, hardened labels for both sets
pub fn perform_fuzzy_clustering(
    training: &Array2<f64>,
    test: &Array2<f64>,
    clusters: usize,
    m: f64,
) -> Result<Assignments> {
    Algorithm::Fuzzy { m }
        .run(training, test, clusters, &ClusteringParams::default())
        .map(|(assignments, _)| assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_titles() {
        assert_eq!(
            Algorithm::Fuzzy { m: 3.0 }.title(2),
            "Clusters: 2, Function: perform_fuzzy_clustering, m: 3"
        );
        assert_eq!(
            Algorithm::Crisp.title(3),
            "Clusters: 3, Function: perform_crisp_clustering"
        );
    }

    #[test]
    fn test_both_algorithms_label_both_sets() {
        let training = array![[0.0, 0.0], [0.2, 0.1], [5.0, 5.0], [5.1, 4.9]];
        let test = array![[0.1, 0.0], [4.9, 5.2], [0.0, 0.3]];

        for algorithm in [Algorithm::Fuzzy { m: 2.0 }, Algorithm::Crisp] {
            let (a, _) = algorithm
                .run(&training, &test, 2, &ClusteringParams::default())
                .unwrap();
            assert_eq!(a.training.len(), 4);
            assert_eq!(a.test.len(), 3);
            assert_eq!(a.test[0], a.training[0]);
            assert_eq!(a.test[1], a.training[2]);
            assert_eq!(a.test[2], a.training[1]);
        }
    }
}
