//! Principal Component Analysis
//!
//! Linear reduction to two dimensions for scatter plots. Components are
//! the top eigenvectors of the sample covariance matrix, extracted by
//! power iteration with deflation.

use crate::error::{PimaError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// PCA configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaConfig {
    /// Number of output dimensions (default 2)
    pub n_components: usize,
    /// Subtract the per-feature mean
    pub center: bool,
    /// Divide by the per-feature standard deviation
    pub scale: bool,
    /// Seed for the power iteration start vectors
    pub random_state: u64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            n_components: 2,
            center: true,
            scale: false,
            random_state: 42,
            max_iter: 500,
            tol: 1e-12,
        }
    }
}

/// A fitted projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaModel {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
    /// Principal axes (n_components × n_features), unit length
    pub components: Array2<f64>,
    /// Variance along each component
    pub explained_variance: Vec<f64>,
    /// Share of total variance along each component
    pub explained_variance_ratio: Vec<f64>,
}

impl PcaModel {
    /// Project `x` onto the fitted components
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(PimaError::ShapeError {
                expected: format!("{} features", self.mean.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let standardized = (x - &self.mean) / &self.std;
        Ok(standardized.dot(&self.components.t()))
    }
}

/// PCA dimensionality reduction
pub struct Pca {
    config: PcaConfig,
}

impl Default for Pca {
    fn default() -> Self {
        Self::new(PcaConfig::default())
    }
}

impl Pca {
    pub fn new(config: PcaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PcaConfig {
        &self.config
    }

    /// Fit components on `x` (rows are samples)
    pub fn fit(&self, x: &Array2<f64>) -> Result<PcaModel> {
        let (n, d) = x.dim();
        if n < 2 {
            return Err(PimaError::DataError(
                "PCA requires at least 2 samples".to_string(),
            ));
        }
        if d < 1 {
            return Err(PimaError::DataError(
                "PCA requires at least 1 feature".to_string(),
            ));
        }
        let k = self.config.n_components.min(d).min(n);
        if k == 0 {
            return Err(PimaError::invalid_parameter(
                "n_components",
                self.config.n_components,
                "must be at least 1",
            ));
        }

        let mean = if self.config.center {
            x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(d))
        } else {
            Array1::zeros(d)
        };
        let std = if self.config.scale {
            x.std_axis(Axis(0), 1.0).mapv(|s| s.max(1e-12))
        } else {
            Array1::ones(d)
        };

        let standardized = (x - &mean) / &std;
        let cov = standardized.t().dot(&standardized) / (n as f64 - 1.0);
        let total_variance = cov.diag().sum().max(1e-12);

        let (eigenvalues, components) = self.power_iteration(&cov, k);

        Ok(PcaModel {
            explained_variance_ratio: eigenvalues
                .iter()
                .map(|&ev| (ev / total_variance).max(0.0))
                .collect(),
            explained_variance: eigenvalues,
            mean,
            std,
            components,
        })
    }

    /// Fit on `x` and project it
    pub fn fit_transform(&self, x: &Array2<f64>) -> Result<(PcaModel, Array2<f64>)> {
        let model = self.fit(x)?;
        let embedding = model.transform(x)?;
        Ok((model, embedding))
    }

    /// Top-`k` eigenpairs of a symmetric matrix.
    fn power_iteration(&self, cov: &Array2<f64>, k: usize) -> (Vec<f64>, Array2<f64>) {
        let d = cov.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let mut work = cov.clone();
        let mut eigenvalues = Vec::with_capacity(k);
        let mut components = Array2::zeros((k, d));

        for c in 0..k {
            let mut v: Array1<f64> = (0..d).map(|_| rng.gen_range(-1.0..1.0)).collect();
            normalize(&mut v);
            for _ in 0..self.config.max_iter {
                let mut w = work.dot(&v);
                if w.dot(&w) <= 1e-300 {
                    // remaining variance is zero
                    break;
                }
                normalize(&mut w);
                let diff = (&w - &v).mapv(|e| e * e).sum();
                v = w;
                if diff < self.config.tol {
                    break;
                }
            }

            orient(&mut v);
            // Rayleigh quotient of the returned vector
            let eigenvalue = v.dot(&work.dot(&v)).max(0.0);

            // Deflate: A -= λ v vᵀ
            for i in 0..d {
                for j in 0..d {
                    work[[i, j]] -= eigenvalue * v[i] * v[j];
                }
            }

            eigenvalues.push(eigenvalue);
            components.row_mut(c).assign(&v);
        }

        (eigenvalues, components)
    }
}

fn normalize(v: &mut Array1<f64>) {
    let norm = v.dot(&*v).sqrt().max(1e-12);
    v.mapv_inplace(|x| x / norm);
}

/// Make the largest-magnitude entry positive so projections are stable
/// across runs.
fn orient(v: &mut Array1<f64>) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

/// Project training and test sets to 2D, each with its own fit.
pub fn perform_pca(training: &Array2<f64>, test: &Array2<f64>) -> Result<[Array2<f64>; 2]> {
    let pca = Pca::default();
    let (_, training_2d) = pca.fit_transform(training)?;
    let (_, test_2d) = pca.fit_transform(test)?;
    Ok([training_2d, test_2d])
}
