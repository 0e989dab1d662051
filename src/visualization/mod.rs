//! Visualization module: 2D projection and scatter charts.

pub mod pca;
pub mod scatter;

pub use pca::{perform_pca, Pca, PcaConfig, PcaModel};
pub use scatter::{plot_datasets, plot_scatter, PlotConfig};
