//! pima-explorer - Clustering analysis of the Pima Indians Diabetes dataset
//!
//! The crate normalizes the raw whitespace-delimited `pima.tr` / `pima.te`
//! files to CSV, clusters the feature vectors with k-means and fuzzy
//! c-means over a range of cluster counts and fuzziness exponents,
//! projects both splits to 2D with PCA and writes scatter charts of the
//! cluster assignments next to the ground-truth diagnoses.
//!
//! # Modules
//!
//! - [`data`] - Raw file normalization and CSV loading
//! - [`clustering`] - K-means and fuzzy c-means
//! - [`visualization`] - PCA and SVG scatter charts
//! - [`evaluation`] - Agreement with the diagnosis labels
//! - [`pipeline`] - End-to-end orchestration, configuration and reports
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Analysis
pub mod data;
pub mod clustering;
pub mod visualization;
pub mod evaluation;
pub mod pipeline;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{PimaError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{PimaError, Result};

    pub use crate::data::{DatasetPair, FilePair, Normalizer, Split};

    pub use crate::clustering::{
        perform_crisp_clustering, perform_fuzzy_clustering, Algorithm, Assignments,
        ClusteringParams, FuzzyCMeans, KMeans,
    };

    pub use crate::visualization::{perform_pca, plot_datasets, Pca, PcaConfig, PlotConfig};

    pub use crate::evaluation::{agreement, aligned_agreement, Evaluation, SetScore};

    pub use crate::pipeline::{Pipeline, PipelineConfig, Report, RunRecord};
}
