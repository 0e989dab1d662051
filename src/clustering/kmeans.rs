//! K-Means clustering with k-means++ seeding and restarts
//!
//! Each restart runs Lloyd iterations from a fresh k-means++ seeding; the
//! restart with the lowest inertia is kept.

use crate::error::{PimaError, Result};
use crate::utils::SimdOps;
use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// K-Means clustering model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: u64,
    /// Fitted cluster centroids (n_clusters × n_features)
    centroids: Option<Array2<f64>>,
    /// Cluster labels assigned during fit
    labels: Option<Array1<usize>>,
    /// Sum of squared distances to nearest centroid
    pub inertia: Option<f64>,
    /// Lloyd iterations used by the winning restart
    pub n_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(2)
    }
}

struct Run {
    centroids: Array2<f64>,
    labels: Array1<usize>,
    inertia: f64,
    n_iter: usize,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            random_state: 42,
            centroids: None,
            labels: None,
            inertia: None,
            n_iter: 0,
        }
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// K-means++ initialization: pick centroids spread apart
    fn kmeans_pp_init(x: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n_samples = x.nrows();
        let mut centroids = Array2::zeros((k, x.ncols()));

        let first = rng.gen_range(0..n_samples);
        centroids.row_mut(0).assign(&x.row(first));

        for c in 1..k {
            let dists: Vec<f64> = (0..n_samples)
                .into_par_iter()
                .map(|i| {
                    let row = x.row(i);
                    (0..c)
                        .map(|j| Self::distance_sq(&row, &centroids.row(j)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            // Weighted random selection proportional to D²
            let total: f64 = dists.iter().sum();
            if total <= 0.0 {
                let idx = rng.gen_range(0..n_samples);
                centroids.row_mut(c).assign(&x.row(idx));
                continue;
            }

            let r = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = n_samples - 1;
            for (i, &d) in dists.iter().enumerate() {
                cumulative += d;
                if cumulative >= r {
                    chosen = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&x.row(chosen));
        }

        centroids
    }

    fn distance_sq(a: &ndarray::ArrayView1<f64>, b: &ndarray::ArrayView1<f64>) -> f64 {
        match (a.as_slice(), b.as_slice()) {
            (Some(a), Some(b)) => SimdOps::squared_euclidean_distance(a, b),
            _ => a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum(),
        }
    }

    fn nearest(row: &ndarray::ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
        let mut best_c = 0;
        let mut best_dist = f64::MAX;
        for (c, centroid) in centroids.outer_iter().enumerate() {
            let d = Self::distance_sq(row, &centroid);
            if d < best_dist {
                best_dist = d;
                best_c = c;
            }
        }
        (best_c, best_dist)
    }

    fn assign(x: &ArrayView2<f64>, centroids: &Array2<f64>) -> Vec<(usize, f64)> {
        (0..x.nrows())
            .into_par_iter()
            .map(|i| Self::nearest(&x.row(i), centroids))
            .collect()
    }

    fn lloyd(&self, x: &ArrayView2<f64>, rng: &mut ChaCha8Rng) -> Run {
        let n_samples = x.nrows();
        let mut centroids = Self::kmeans_pp_init(x, self.n_clusters, rng);
        let mut labels = Array1::from_elem(n_samples, usize::MAX);
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;

            let assignment = Self::assign(x, &centroids);
            let new_labels: Array1<usize> = assignment.iter().map(|&(c, _)| c).collect();
            let changed = new_labels
                .iter()
                .zip(labels.iter())
                .filter(|(a, b)| a != b)
                .count();
            labels = new_labels;

            // Update step: recompute centroids
            let mut new_centroids = Array2::zeros(centroids.dim());
            let mut counts = vec![0usize; self.n_clusters];
            for (i, &c) in labels.iter().enumerate() {
                counts[c] += 1;
                let mut row = new_centroids.row_mut(c);
                row += &x.row(i);
            }

            for c in 0..self.n_clusters {
                if counts[c] > 0 {
                    new_centroids
                        .row_mut(c)
                        .mapv_inplace(|v| v / counts[c] as f64);
                } else {
                    // Empty cluster: reseed from a random sample
                    let idx = rng.gen_range(0..n_samples);
                    new_centroids.row_mut(c).assign(&x.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if changed == 0 || shift < self.tol {
                break;
            }
        }

        // Labels and inertia against the final centroids
        let assignment = Self::assign(x, &centroids);
        let labels: Array1<usize> = assignment.iter().map(|&(c, _)| c).collect();
        let inertia = assignment.iter().map(|&(_, d)| d).sum();

        Run {
            centroids,
            labels,
            inertia,
            n_iter,
        }
    }

    fn validate(&self, n_samples: usize) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(PimaError::invalid_parameter(
                "n_clusters",
                self.n_clusters,
                "must be at least 1",
            ));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(PimaError::invalid_parameter(
                "n_init/max_iter",
                format!("{}/{}", self.n_init, self.max_iter),
                "must be at least 1",
            ));
        }
        if n_samples < self.n_clusters {
            return Err(PimaError::ClusteringError(format!(
                "n_samples ({}) < n_clusters ({})",
                n_samples, self.n_clusters
            )));
        }
        Ok(())
    }

    /// Fit the model on `x` (rows are samples)
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        self.validate(x.nrows())?;

        let view = x.view();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut best: Option<Run> = None;

        for restart in 0..self.n_init {
            let run = self.lloyd(&view, &mut rng);
            debug!(restart, inertia = run.inertia, n_iter = run.n_iter, "k-means restart");
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let best = best.ok_or(PimaError::ModelNotFitted)?;
        self.centroids = Some(best.centroids);
        self.labels = Some(best.labels);
        self.inertia = Some(best.inertia);
        self.n_iter = best.n_iter;
        Ok(self)
    }

    /// Predict cluster labels for new data
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let centroids = self.centroids.as_ref().ok_or(PimaError::ModelNotFitted)?;
        if x.ncols() != centroids.ncols() {
            return Err(PimaError::ShapeError {
                expected: format!("{} features", centroids.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(Self::assign(&x.view(), centroids)
            .into_iter()
            .map(|(c, _)| c)
            .collect())
    }

    /// Labels of the training samples
    pub fn labels(&self) -> Option<&Array1<usize>> {
        self.labels.as_ref()
    }

    /// Get cluster centroids
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.centroids.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_kmeans_basic() {
        let x = array![
            [1.0, 1.0], [1.5, 1.5], [1.2, 1.3],
            [8.0, 8.0], [8.5, 8.5], [8.2, 8.3],
        ];
        let mut model = KMeans::new(2);
        model.fit(&x).unwrap();
        assert!(model.is_fitted());
        let labels = model.labels().unwrap();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[3], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_kmeans_predict() {
        let x = array![[0.0, 0.0], [0.5, 0.5], [10.0, 10.0], [10.5, 10.5]];
        let mut model = KMeans::new(2);
        model.fit(&x).unwrap();

        let new_x = array![[0.1, 0.1], [10.1, 10.1]];
        let labels = model.predict(&new_x).unwrap();
        assert_ne!(labels[0], labels[1]);
        assert_eq!(labels[0], model.labels().unwrap()[0]);
    }

    #[test]
    fn test_kmeans_inertia() {
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [10.0, 10.0]];
        let mut model = KMeans::new(2);
        model.fit(&x).unwrap();
        // best split is {3 points near origin} vs {far point}
        let inertia = model.inertia.unwrap();
        assert!((inertia - 4.0 / 3.0).abs() < 1e-9, "inertia = {}", inertia);
    }

    #[test]
    fn test_kmeans_too_few_samples() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let mut model = KMeans::new(3);
        assert!(model.fit(&x).is_err());
    }

    #[test]
    fn test_kmeans_predict_unfitted() {
        let model = KMeans::new(2);
        let x = array![[0.0, 0.0]];
        assert!(matches!(model.predict(&x), Err(PimaError::ModelNotFitted)));
    }

    #[test]
    fn test_kmeans_predict_shape_mismatch() {
        let x = array![[0.0, 0.0], [5.0, 5.0]];
        let mut model = KMeans::new(2);
        model.fit(&x).unwrap();
        assert!(model.predict(&array![[1.0, 2.0, 3.0]]).is_err());
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let x = array![
            [1.0, 2.0], [1.1, 2.1], [5.0, 5.0], [5.2, 4.9], [9.0, 1.0], [9.1, 1.2],
        ];
        let mut a = KMeans::new(3).with_random_state(7);
        let mut b = KMeans::new(3).with_random_state(7);
        a.fit(&x).unwrap();
        b.fit(&x).unwrap();
        assert_eq!(a.labels(), b.labels());
    }
}
