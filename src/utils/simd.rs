//! Vectorized distance kernels
//!
//! AVX2 paths are selected at runtime; every function has a scalar
//! fallback with identical results up to summation order.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// SIMD-accelerated distance operations
pub struct SimdOps;

impl SimdOps {
    /// Squared Euclidean distance
    pub fn squared_euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
        assert_eq!(a.len(), b.len(), "Arrays must have same length");

        #[cfg(target_arch = "x86_64")]
        if a.len() >= 4 && is_x86_feature_detected!("avx2") {
            return unsafe { Self::squared_distance_avx(a, b) };
        }

        a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    /// Euclidean distance
    pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
        Self::squared_euclidean_distance(a, b).sqrt()
    }

    #[cfg(target_arch = "x86_64")]
    #[target_feature(enable = "avx2")]
    unsafe fn squared_distance_avx(a: &[f64], b: &[f64]) -> f64 {
        let chunks_a = a.chunks_exact(4);
        let chunks_b = b.chunks_exact(4);
        let tail_a = chunks_a.remainder();
        let tail_b = chunks_b.remainder();

        let mut acc = _mm256_setzero_pd();
        for (ca, cb) in chunks_a.zip(chunks_b) {
            let va = _mm256_loadu_pd(ca.as_ptr());
            let vb = _mm256_loadu_pd(cb.as_ptr());
            let d = _mm256_sub_pd(va, vb);
            acc = _mm256_add_pd(acc, _mm256_mul_pd(d, d));
        }

        let low = _mm256_castpd256_pd128(acc);
        let high = _mm256_extractf128_pd(acc, 1);
        let pair = _mm_add_pd(low, high);
        let upper = _mm_unpackhi_pd(pair, pair);
        let mut total = _mm_cvtsd_f64(_mm_add_sd(pair, upper));

        for (&x, &y) in tail_a.iter().zip(tail_b.iter()) {
            total += (x - y) * (x - y);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((SimdOps::euclidean_distance(&a, &b) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_squared_distance_long_vectors() {
        let a: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..9).map(|i| i as f64 + 2.0).collect();
        assert!((SimdOps::squared_euclidean_distance(&a, &b) - 36.0).abs() < 1e-10);
    }

    #[test]
    fn test_avx_and_scalar_paths_agree() {
        let a: Vec<f64> = (0..13).map(|i| (i as f64).sin()).collect();
        let b: Vec<f64> = (0..13).map(|i| (i as f64 * 0.5).cos()).collect();
        let scalar: f64 = a.iter().zip(&b).map(|(x, y)| (x - y) * (x - y)).sum();
        assert!((SimdOps::squared_euclidean_distance(&a, &b) - scalar).abs() < 1e-12);
    }
}
