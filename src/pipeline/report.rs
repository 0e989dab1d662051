//! Run report

use crate::clustering::{Algorithm, FitQuality};
use crate::error::Result;
use crate::evaluation::{Evaluation, SetScore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of one clustering run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub clusters: usize,
    pub algorithm: Algorithm,
    pub title: String,
    pub evaluation: Evaluation,
    pub quality: FitQuality,
    pub plots: Vec<PathBuf>,
    pub elapsed_ms: f64,
}

/// Dataset facts shared by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub features: Vec<String>,
    pub rows: SetScore,
    pub positive: SetScore,
    /// Explained variance ratio of the 2D projection per split
    pub explained_variance_ratio: [Vec<f64>; 2],
}

/// Everything a pipeline run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub dataset: DatasetSummary,
    pub ground_truth_plots: Vec<PathBuf>,
    pub runs: Vec<RunRecord>,
}

impl Report {
    /// Run with the highest majority-aligned training agreement
    pub fn best_run(&self) -> Option<&RunRecord> {
        self.runs.iter().max_by(|a, b| {
            a.evaluation
                .aligned
                .training
                .cmp(&b.evaluation.aligned.training)
                .then(b.clusters.cmp(&a.clusters))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(clusters: usize, aligned: usize) -> RunRecord {
        let score = SetScore { training: aligned, test: 0 };
        RunRecord {
            clusters,
            algorithm: Algorithm::Crisp,
            title: Algorithm::Crisp.title(clusters),
            evaluation: Evaluation {
                agreement: score,
                aligned: score,
                sizes: SetScore { training: 10, test: 5 },
            },
            quality: FitQuality::Inertia { value: 1.0, n_iter: 3 },
            plots: Vec::new(),
            elapsed_ms: 0.5,
        }
    }

    fn report(runs: Vec<RunRecord>) -> Report {
        Report {
            dataset: DatasetSummary {
                features: vec!["glu".to_string()],
                rows: SetScore { training: 10, test: 5 },
                positive: SetScore { training: 3, test: 2 },
                explained_variance_ratio: [vec![0.9, 0.1], vec![0.8, 0.2]],
            },
            ground_truth_plots: Vec::new(),
            runs,
        }
    }

    #[test]
    fn test_best_run_prefers_fewer_clusters_on_tie() {
        let r = report(vec![record(2, 7), record(3, 7), record(3, 5)]);
        assert_eq!(r.best_run().unwrap().clusters, 2);
    }

    #[test]
    fn test_json_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let r = report(vec![record(2, 7)]);
        r.write_json(&path).unwrap();

        let back = Report::from_json_file(&path).unwrap();
        assert_eq!(back.runs.len(), 1);
        assert_eq!(back.runs[0].algorithm, Algorithm::Crisp);
        assert!(r.to_json().unwrap().contains("\"name\": \"crisp\""));
    }
}
