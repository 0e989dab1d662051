//! Pipeline configuration

use crate::clustering::ClusteringParams;
use crate::data::FilePair;
use crate::error::{PimaError, Result};
use crate::visualization::PlotConfig;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Inclusive integer range that serializes as `{ "start": a, "end": b }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Configuration for a full analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the raw and normalized files
    pub data_dir: PathBuf,

    /// Raw whitespace-delimited training file name
    pub raw_training: String,

    /// Raw whitespace-delimited test file name
    pub raw_test: String,

    /// Normalized training CSV file name
    pub training_csv: String,

    /// Normalized test CSV file name
    pub test_csv: String,

    /// Skip normalization and read the CSV files directly
    pub skip_preprocess: bool,

    /// Cluster counts to try
    pub clusters: Span,

    /// Fuzziness exponents to try for fuzzy c-means
    pub fuzziness: Span,

    /// Numeric settings shared by the clustering algorithms
    pub clustering: ClusteringParams,

    /// Whether to write charts
    pub plot: bool,

    /// Directory for chart files
    pub plot_dir: PathBuf,

    pub plot_style: PlotConfig,

    /// Optional JSON report destination
    pub report_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("models"),
            raw_training: "pima.tr".to_string(),
            raw_test: "pima.te".to_string(),
            training_csv: "training.csv".to_string(),
            test_csv: "test.csv".to_string(),
            skip_preprocess: false,
            clusters: Span::new(2, 3),
            fuzziness: Span::new(2, 4),
            clustering: ClusteringParams::default(),
            plot: true,
            plot_dir: PathBuf::from("plots"),
            plot_style: PlotConfig::default(),
            report_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PimaError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_clusters(mut self, start: usize, end: usize) -> Self {
        self.clusters = Span::new(start, end);
        self
    }

    pub fn with_fuzziness(mut self, start: usize, end: usize) -> Self {
        self.fuzziness = Span::new(start, end);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.clustering.random_state = seed;
        self
    }

    pub fn with_plot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plot_dir = dir.into();
        self
    }

    pub fn with_plot(mut self, plot: bool) -> Self {
        self.plot = plot;
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    pub fn with_skip_preprocess(mut self, skip: bool) -> Self {
        self.skip_preprocess = skip;
        self
    }

    /// Raw-to-CSV pairs for (training, test)
    pub fn file_pairs(&self) -> [FilePair; 2] {
        [
            FilePair::new(
                self.data_dir.join(&self.raw_training),
                self.data_dir.join(&self.training_csv),
            ),
            FilePair::new(
                self.data_dir.join(&self.raw_test),
                self.data_dir.join(&self.test_csv),
            ),
        ]
    }

    pub fn training_csv_path(&self) -> PathBuf {
        self.data_dir.join(&self.training_csv)
    }

    pub fn test_csv_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_csv)
    }

    /// Check ranges and numeric settings
    pub fn validate(&self) -> Result<()> {
        if self.clusters.is_empty() || self.clusters.start == 0 {
            return Err(PimaError::ConfigError(format!(
                "cluster range {}..={} must be non-empty and start at 1 or more",
                self.clusters.start, self.clusters.end
            )));
        }
        if self.fuzziness.is_empty() || self.fuzziness.start < 2 {
            return Err(PimaError::ConfigError(format!(
                "fuzziness range {}..={} must be non-empty with m > 1",
                self.fuzziness.start, self.fuzziness.end
            )));
        }
        if !(self.clustering.fuzzy_error > 0.0) {
            return Err(PimaError::ConfigError(
                "fuzzy_error must be positive".to_string(),
            ));
        }
        if self.clustering.fuzzy_max_iter == 0
            || self.clustering.kmeans_max_iter == 0
            || self.clustering.kmeans_n_init == 0
        {
            return Err(PimaError::ConfigError(
                "iteration limits and n_init must be at least 1".to_string(),
            ));
        }
        if self.plot_style.width == 0 || self.plot_style.height == 0 {
            return Err(PimaError::ConfigError(
                "plot dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
