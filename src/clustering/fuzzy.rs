//! Fuzzy c-means clustering
//!
//! Memberships are stored cluster-major: `u[[j, i]]` is the degree to
//! which sample `i` belongs to cluster `j`, and every column sums to 1.
//!
//! One iteration:
//! - `um = u^m`
//! - `centers = um · x / rowsum(um)`
//! - `d[j, i] = max(‖x_i − c_j‖, ε)`
//! - `jm = Σ um · d²`
//! - `u = d^(−2/(m−1))`, column-normalized
//!
//! Iteration stops once the Frobenius norm of the membership change
//! drops below `error`, or after `max_iter` iterations.

use crate::error::{PimaError, Result};
use crate::utils::SimdOps;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fuzzy c-means clustering model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyCMeans {
    pub n_clusters: usize,
    /// Fuzziness exponent, must be > 1
    pub m: f64,
    /// Stopping threshold on the membership change
    pub error: f64,
    pub max_iter: usize,
    pub random_state: u64,
    fitted: Option<FuzzyFit>,
}

/// State of a fitted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyFit {
    /// Cluster centers (n_clusters × n_features)
    pub centers: Array2<f64>,
    /// Final membership (n_clusters × n_samples)
    pub membership: Array2<f64>,
    /// Initial membership
    pub initial_membership: Array2<f64>,
    /// Final center-to-sample distances (n_clusters × n_samples)
    pub distances: Array2<f64>,
    /// Objective value after each iteration
    pub objective: Vec<f64>,
    pub n_iter: usize,
    /// Fuzzy partition coefficient
    pub fpc: f64,
}

/// Memberships of unseen data against fixed centers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyPrediction {
    pub membership: Array2<f64>,
    pub initial_membership: Array2<f64>,
    pub distances: Array2<f64>,
    pub objective: Vec<f64>,
    pub n_iter: usize,
    pub fpc: f64,
}

impl FuzzyPrediction {
    /// Hard labels by maximum membership
    pub fn labels(&self) -> Array1<usize> {
        harden(&self.membership)
    }
}

impl Default for FuzzyCMeans {
    fn default() -> Self {
        Self::new(2, 2.0)
    }
}

impl FuzzyCMeans {
    pub fn new(n_clusters: usize, m: f64) -> Self {
        Self {
            n_clusters,
            m,
            error: 0.005,
            max_iter: 1000,
            random_state: 42,
            fitted: None,
        }
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn validate(&self, n_samples: usize) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(PimaError::invalid_parameter(
                "n_clusters",
                self.n_clusters,
                "must be at least 1",
            ));
        }
        if !(self.m > 1.0) {
            return Err(PimaError::invalid_parameter("m", self.m, "fuzziness must be > 1"));
        }
        if !(self.error > 0.0) {
            return Err(PimaError::invalid_parameter("error", self.error, "must be > 0"));
        }
        if self.max_iter == 0 {
            return Err(PimaError::invalid_parameter("max_iter", 0, "must be at least 1"));
        }
        if n_samples < self.n_clusters {
            return Err(PimaError::ClusteringError(format!(
                "n_samples ({}) < n_clusters ({})",
                n_samples, self.n_clusters
            )));
        }
        Ok(())
    }

    /// Uniform random membership with columns summing to 1
    fn random_membership(&self, n_samples: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let mut u = Array2::from_shape_fn((self.n_clusters, n_samples), |_| rng.gen::<f64>());
        normalize_columns(&mut u);
        u
    }

    /// Fit on `x` (rows are samples)
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        self.validate(n_samples)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let initial = self.random_membership(n_samples, &mut rng);

        let mut u = initial.clone();
        let mut objective = Vec::new();
        let mut n_iter = 0;

        let (centers, distances) = loop {
            let u_old = floor_membership(u);
            let um = u_old.mapv(|v| v.powf(self.m));

            let centers = weighted_centers(&um, x);
            let distances = center_distances(x, &centers);
            objective.push((&um * &distances.mapv(|v| v * v)).sum());
            u = membership_from_distances(&distances, self.m);
            n_iter += 1;

            if frobenius_diff(&u, &u_old) < self.error || n_iter >= self.max_iter {
                break (centers, distances);
            }
        };

        let fpc = partition_coefficient(&u);
        debug!(
            n_clusters = self.n_clusters,
            m = self.m,
            n_iter,
            fpc,
            "fuzzy c-means converged"
        );

        self.fitted = Some(FuzzyFit {
            centers,
            membership: u,
            initial_membership: initial,
            distances,
            objective,
            n_iter,
            fpc,
        });
        Ok(self)
    }

    /// Memberships of new data with the fitted centers held fixed
    pub fn predict(&self, x: &Array2<f64>) -> Result<FuzzyPrediction> {
        let fit = self.fitted.as_ref().ok_or(PimaError::ModelNotFitted)?;
        predict_with_centers(
            x,
            &fit.centers,
            self.m,
            self.error,
            self.max_iter,
            self.random_state.wrapping_add(1),
        )
    }

    pub fn fitted(&self) -> Option<&FuzzyFit> {
        self.fitted.as_ref()
    }

    /// Hard labels of the training samples
    pub fn labels(&self) -> Option<Array1<usize>> {
        self.fitted.as_ref().map(|f| harden(&f.membership))
    }

    pub fn centers(&self) -> Option<&Array2<f64>> {
        self.fitted.as_ref().map(|f| &f.centers)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

/// Membership of `x` against fixed `centers`, iterated from a random start.
pub fn predict_with_centers(
    x: &Array2<f64>,
    centers: &Array2<f64>,
    m: f64,
    error: f64,
    max_iter: usize,
    seed: u64,
) -> Result<FuzzyPrediction> {
    if x.ncols() != centers.ncols() {
        return Err(PimaError::ShapeError {
            expected: format!("{} features", centers.ncols()),
            actual: format!("{} features", x.ncols()),
        });
    }
    if !(m > 1.0) {
        return Err(PimaError::invalid_parameter("m", m, "fuzziness must be > 1"));
    }
    if max_iter == 0 {
        return Err(PimaError::invalid_parameter("max_iter", 0, "must be at least 1"));
    }

    let n_clusters = centers.nrows();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut initial = Array2::from_shape_fn((n_clusters, x.nrows()), |_| rng.gen::<f64>());
    normalize_columns(&mut initial);

    // Distances do not depend on the membership when centers are fixed
    let distances = center_distances(x, centers);
    let d2 = distances.mapv(|v| v * v);

    let mut u = initial.clone();
    let mut objective = Vec::new();
    let mut n_iter = 0;

    while n_iter < max_iter {
        let u_old = floor_membership(u);
        let um = u_old.mapv(|v| v.powf(m));
        objective.push((&um * &d2).sum());
        u = membership_from_distances(&distances, m);
        n_iter += 1;

        if frobenius_diff(&u, &u_old) < error {
            break;
        }
    }

    let fpc = partition_coefficient(&u);
    Ok(FuzzyPrediction {
        membership: u,
        initial_membership: initial,
        distances,
        objective,
        n_iter,
        fpc,
    })
}

/// Argmax over clusters for each sample
pub fn harden(membership: &Array2<f64>) -> Array1<usize> {
    membership
        .axis_iter(Axis(1))
        .map(|col| {
            col.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |best, (j, &v)| {
                    if v > best.1 { (j, v) } else { best }
                })
                .0
        })
        .collect()
}

/// `trace(u · uᵀ) / n`, equal to 1 for a crisp partition and `1/c` for a
/// uniform one.
pub fn partition_coefficient(membership: &Array2<f64>) -> f64 {
    let n = membership.ncols().max(1) as f64;
    membership.mapv(|v| v * v).sum() / n
}

fn normalize_columns(u: &mut Array2<f64>) {
    for mut col in u.axis_iter_mut(Axis(1)) {
        let total = col.sum();
        if total > 0.0 {
            col.mapv_inplace(|v| v / total);
        }
    }
}

fn floor_membership(mut u: Array2<f64>) -> Array2<f64> {
    normalize_columns(&mut u);
    u.mapv_inplace(|v| v.max(f64::EPSILON));
    u
}

fn weighted_centers(um: &Array2<f64>, x: &Array2<f64>) -> Array2<f64> {
    let mut centers = um.dot(x);
    let weights = um.sum_axis(Axis(1));
    for (mut row, &w) in centers.outer_iter_mut().zip(weights.iter()) {
        row.mapv_inplace(|v| v / w);
    }
    centers
}

/// Distances cluster-major (n_clusters × n_samples), floored at ε
fn center_distances(x: &Array2<f64>, centers: &Array2<f64>) -> Array2<f64> {
    let n_clusters = centers.nrows();
    let n_samples = x.nrows();
    let per_sample: Vec<Vec<f64>> = (0..n_samples)
        .into_par_iter()
        .map(|i| {
            let row = x.row(i);
            centers
                .outer_iter()
                .map(|c| {
                    let d = match (row.as_slice(), c.as_slice()) {
                        (Some(a), Some(b)) => SimdOps::euclidean_distance(a, b),
                        _ => row
                            .iter()
                            .zip(c.iter())
                            .map(|(a, b)| (a - b).powi(2))
                            .sum::<f64>()
                            .sqrt(),
                    };
                    d.max(f64::EPSILON)
                })
                .collect()
        })
        .collect();

    Array2::from_shape_fn((n_clusters, n_samples), |(j, i)| per_sample[i][j])
}

fn membership_from_distances(distances: &Array2<f64>, m: f64) -> Array2<f64> {
    let exponent = -2.0 / (m - 1.0);
    let mut u = distances.mapv(|d| d.powf(exponent));
    normalize_columns(&mut u);
    u
}

fn frobenius_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> Array2<f64> {
        array![
            [1.0, 1.0], [1.2, 0.9], [0.9, 1.1], [1.1, 1.2],
            [8.0, 8.0], [8.1, 7.9], [7.9, 8.2], [8.2, 8.1],
        ]
    }

    #[test]
    fn test_fit_separates_blobs() {
        let x = two_blobs();
        let mut model = FuzzyCMeans::new(2, 2.0);
        model.fit(&x).unwrap();
        let labels = model.labels().unwrap();
        assert!(labels.iter().take(4).all(|&l| l == labels[0]));
        assert!(labels.iter().skip(4).all(|&l| l == labels[4]));
        assert_ne!(labels[0], labels[4]);
    }

    #[test]
    fn test_membership_columns_sum_to_one() {
        let x = two_blobs();
        let mut model = FuzzyCMeans::new(3, 2.5);
        model.fit(&x).unwrap();
        let fit = model.fitted().unwrap();
        for col in fit.membership.axis_iter(Axis(1)) {
            assert!((col.sum() - 1.0).abs() < 1e-9);
        }
        assert_eq!(fit.membership.dim(), (3, 8));
        assert_eq!(fit.centers.dim(), (3, 2));
        assert_eq!(fit.objective.len(), fit.n_iter);
    }

    #[test]
    fn test_fpc_bounds() {
        let x = two_blobs();
        let mut model = FuzzyCMeans::new(2, 2.0);
        model.fit(&x).unwrap();
        let fpc = model.fitted().unwrap().fpc;
        assert!(fpc > 0.5 && fpc <= 1.0 + 1e-12, "fpc = {}", fpc);
    }

    #[test]
    fn test_higher_m_is_fuzzier() {
        let x = two_blobs();
        let mut sharp = FuzzyCMeans::new(2, 1.5);
        let mut soft = FuzzyCMeans::new(2, 4.0);
        sharp.fit(&x).unwrap();
        soft.fit(&x).unwrap();
        assert!(sharp.fitted().unwrap().fpc > soft.fitted().unwrap().fpc);
    }

    #[test]
    fn test_predict_matches_training_clusters() {
        let x = two_blobs();
        let mut model = FuzzyCMeans::new(2, 2.0);
        model.fit(&x).unwrap();
        let train_labels = model.labels().unwrap();

        let new_x = array![[1.05, 1.0], [8.05, 8.0]];
        let prediction = model.predict(&new_x).unwrap();
        let labels = prediction.labels();
        assert_eq!(labels[0], train_labels[0]);
        assert_eq!(labels[1], train_labels[4]);
        // fixed centers converge on the second pass
        assert!(prediction.n_iter <= 2);
    }

    #[test]
    fn test_invalid_fuzziness() {
        let x = two_blobs();
        let mut model = FuzzyCMeans::new(2, 1.0);
        assert!(matches!(
            model.fit(&x),
            Err(PimaError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_predict_unfitted() {
        let model = FuzzyCMeans::new(2, 2.0);
        assert!(matches!(
            model.predict(&two_blobs()),
            Err(PimaError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_predict_feature_mismatch() {
        let mut model = FuzzyCMeans::new(2, 2.0);
        model.fit(&two_blobs()).unwrap();
        let wide = array![[1.0, 1.0, 1.0], [8.0, 8.0, 8.0]];
        assert!(matches!(
            model.predict(&wide),
            Err(PimaError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_harden_argmax() {
        let u = array![[0.9, 0.2, 0.5], [0.1, 0.8, 0.5]];
        // ties resolve to the lowest cluster index
        assert_eq!(harden(&u).to_vec(), vec![0, 1, 0]);
    }

    #[test]
    fn test_partition_coefficient_extremes() {
        let crisp = array![[1.0, 0.0], [0.0, 1.0]];
        let uniform = array![[0.5, 0.5], [0.5, 0.5]];
        assert!((partition_coefficient(&crisp) - 1.0).abs() < 1e-12);
        assert!((partition_coefficient(&uniform) - 0.5).abs() < 1e-12);
    }
}
