//! Scatter charts of 2D projections colored by cluster label

use crate::error::{PimaError, Result};
use crate::utils::slugify;
use ndarray::{Array1, Array2};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffixes appended to the chart title for (training, test)
pub const SET_SUFFIXES: [&str; 2] = [" training set", " test set"];

/// Chart rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub marker_size: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 650,
            marker_size: 3,
        }
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> PimaError {
    PimaError::PlotError(e.to_string())
}

/// Axis range with a small margin; degenerate ranges are widened.
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return -1.0..1.0;
    }
    let span = (hi - lo).max(1e-9);
    let pad = span * 0.05;
    (lo - pad)..(hi + pad)
}

/// Points of `points` whose label equals `cluster`
fn cluster_points(points: &Array2<f64>, labels: &Array1<usize>, cluster: usize) -> Vec<(f64, f64)> {
    points
        .outer_iter()
        .zip(labels.iter())
        .filter(|(_, l)| **l == cluster)
        .map(|(row, _)| (row[0], row.get(1).copied().unwrap_or(0.0)))
        .collect()
}

/// Draw one scatter chart to an SVG file.
///
/// Every cluster `j in 0..clusters` becomes a series labelled `series j`.
pub fn plot_scatter(
    path: &Path,
    points: &Array2<f64>,
    labels: &Array1<usize>,
    clusters: usize,
    title: &str,
    config: &PlotConfig,
) -> Result<()> {
    if points.nrows() != labels.len() {
        return Err(PimaError::ShapeError {
            expected: format!("{} labels", points.nrows()),
            actual: format!("{} labels", labels.len()),
        });
    }
    if points.ncols() == 0 {
        return Err(PimaError::PlotError("points have no coordinates".to_string()));
    }

    let x_range = padded_range(points.column(0).iter().copied());
    let y_range = if points.ncols() > 1 {
        padded_range(points.column(1).iter().copied())
    } else {
        -1.0..1.0
    };

    let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("PC 1")
        .y_desc("PC 2")
        .draw()
        .map_err(plot_err)?;

    let size = config.marker_size;
    for j in 0..clusters {
        let color = Palette99::pick(j).to_rgba();
        chart
            .draw_series(
                cluster_points(points, labels, j)
                    .into_iter()
                    .map(move |p| Circle::new(p, size, color.filled())),
            )
            .map_err(plot_err)?
            .label(format!("series {}", j))
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    debug!(path = %path.display(), title, "Chart written");
    Ok(())
}

/// Plot the training and test projections, one SVG per set.
///
/// Titles get `" training set"` / `" test set"` appended and file names
/// are derived from the full title. Returns the written paths.
pub fn plot_datasets(
    pca_sets: &[Array2<f64>; 2],
    labels: [&Array1<usize>; 2],
    clusters: usize,
    title: &str,
    out_dir: &Path,
    config: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(2);
    for ((points, set_labels), suffix) in pca_sets.iter().zip(labels).zip(SET_SUFFIXES) {
        let full_title = format!("{}{}", title, suffix);
        let path = out_dir.join(format!("{}.svg", slugify(&full_title)));
        plot_scatter(&path, points, set_labels, clusters, &full_title, config)?;
        written.push(path);
    }
    Ok(written)
}
