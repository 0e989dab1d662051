//! Analysis pipeline: preprocess → load → reduce → cluster → plot
//!
//! PCA is fit separately on each split, so the training and test charts
//! live in different projections.

mod config;
mod report;

pub use config::{PipelineConfig, Span};
pub use report::{DatasetSummary, Report, RunRecord};

use crate::clustering::{Algorithm, FitQuality};
use crate::data::{DatasetPair, Normalizer};
use crate::error::Result;
use crate::evaluation::{Evaluation, SetScore};
use crate::utils::Timer;
use crate::visualization::{plot_datasets, Pca, PcaConfig};
use ndarray::{Array1, Array2};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Title of the ground-truth chart
pub const GROUND_TRUTH_TITLE: &str = "Default diagnoses";

/// Number of classes in the ground truth
pub const DIAGNOSIS_CLASSES: usize = 2;

/// Projected splits and their explained variance
#[derive(Debug, Clone)]
pub struct Projection {
    pub sets: [Array2<f64>; 2],
    pub explained_variance_ratio: [Vec<f64>; 2],
}

/// Orchestrates a full analysis run
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalize both raw files into CSV
    pub fn preprocess(&self) -> Result<Vec<usize>> {
        let normalizer = Normalizer::new()?;
        normalizer.normalize_pairs(&self.config.file_pairs())
    }

    /// Load the normalized CSV files
    pub fn load(&self) -> Result<DatasetPair> {
        DatasetPair::load(&self.config.training_csv_path(), &self.config.test_csv_path())
    }

    /// 2D projection of each split with its own PCA fit
    pub fn project(&self, data: &DatasetPair) -> Result<Projection> {
        let pca = Pca::new(PcaConfig {
            random_state: self.config.clustering.random_state,
            ..PcaConfig::default()
        });
        let (train_model, train_2d) = pca.fit_transform(&data.training.features)?;
        let (test_model, test_2d) = pca.fit_transform(&data.test.features)?;
        debug!(
            training = ?train_model.explained_variance_ratio,
            test = ?test_model.explained_variance_ratio,
            "PCA explained variance"
        );
        Ok(Projection {
            sets: [train_2d, test_2d],
            explained_variance_ratio: [
                train_model.explained_variance_ratio,
                test_model.explained_variance_ratio,
            ],
        })
    }

    /// Fuzzy c-means for every configured fuzziness, then k-means
    pub fn algorithms(&self) -> Vec<Algorithm> {
        self.config
            .fuzziness
            .iter()
            .map(|m| Algorithm::Fuzzy { m: m as f64 })
            .chain(std::iter::once(Algorithm::Crisp))
            .collect()
    }

    fn plot(
        &self,
        projection: &Projection,
        labels: [&Array1<usize>; 2],
        clusters: usize,
        title: &str,
    ) -> Result<Vec<PathBuf>> {
        if !self.config.plot {
            return Ok(Vec::new());
        }
        plot_datasets(
            &projection.sets,
            labels,
            clusters,
            title,
            &self.config.plot_dir,
            &self.config.plot_style,
        )
    }

    /// Plot the ground-truth diagnoses
    pub fn plot_ground_truth(
        &self,
        data: &DatasetPair,
        projection: &Projection,
    ) -> Result<Vec<PathBuf>> {
        self.plot(
            projection,
            [&data.training.diagnoses, &data.test.diagnoses],
            DIAGNOSIS_CLASSES,
            GROUND_TRUTH_TITLE,
        )
    }

    /// Cluster, score and plot a single algorithm
    pub fn run_algorithm(
        &self,
        data: &DatasetPair,
        projection: &Projection,
        clusters: usize,
        algorithm: Algorithm,
    ) -> Result<RunRecord> {
        let timer = Timer::start();
        let (assignments, quality) = algorithm.run(
            &data.training.features,
            &data.test.features,
            clusters,
            &self.config.clustering,
        )?;
        let elapsed_ms = timer.elapsed_ms();

        if let FitQuality::PartitionCoefficient { n_iter, .. } = quality {
            if n_iter >= self.config.clustering.fuzzy_max_iter {
                warn!(clusters, algorithm = %algorithm, n_iter, "Fuzzy c-means hit max_iter without converging");
            }
        }

        let evaluation = Evaluation::score(
            &assignments,
            [&data.training.diagnoses, &data.test.diagnoses],
        )?;

        let title = algorithm.title(clusters);
        info!(
            clusters,
            algorithm = %algorithm,
            agreement = %evaluation.agreement,
            aligned = %evaluation.aligned,
            "Clustering finished"
        );

        let plots = self.plot(projection, assignments.sets(), clusters, &title)?;

        Ok(RunRecord {
            clusters,
            algorithm,
            title,
            evaluation,
            quality,
            plots,
            elapsed_ms,
        })
    }

    /// Full run; `on_run` sees every record as soon as it is produced.
    pub fn run_with<F>(&self, mut on_run: F) -> Result<Report>
    where
        F: FnMut(&RunRecord),
    {
        if self.config.skip_preprocess {
            debug!("Skipping raw file normalization");
        } else {
            self.preprocess()?;
        }

        let data = self.load()?;
        let projection = self.project(&data)?;
        let ground_truth_plots = self.plot_ground_truth(&data, &projection)?;

        let mut runs = Vec::new();
        for clusters in self.config.clusters.iter() {
            for algorithm in self.algorithms() {
                let record = self.run_algorithm(&data, &projection, clusters, algorithm)?;
                on_run(&record);
                runs.push(record);
            }
        }

        let report = Report {
            dataset: DatasetSummary {
                features: data.feature_names.clone(),
                rows: SetScore {
                    training: data.training.n_samples(),
                    test: data.test.n_samples(),
                },
                positive: SetScore {
                    training: data.training.n_positive(),
                    test: data.test.n_positive(),
                },
                explained_variance_ratio: projection.explained_variance_ratio,
            },
            ground_truth_plots,
            runs,
        };

        if let Some(path) = &self.config.report_path {
            report.write_json(path)?;
            info!(path = %path.display(), "Report written");
        }

        Ok(report)
    }

    pub fn run(&self) -> Result<Report> {
        self.run_with(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_order() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let algorithms = pipeline.algorithms();
        assert_eq!(
            algorithms,
            vec![
                Algorithm::Fuzzy { m: 2.0 },
                Algorithm::Fuzzy { m: 3.0 },
                Algorithm::Fuzzy { m: 4.0 },
                Algorithm::Crisp,
            ]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig::default().with_clusters(4, 2);
        assert!(Pipeline::new(config).is_err());
    }
}
