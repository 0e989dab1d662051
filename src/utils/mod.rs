//! Utility functions and types

pub mod simd;

pub use simd::SimdOps;

use std::time::{Duration, Instant};

/// Wall-clock timer for pipeline stages
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// File-name-safe slug of a chart title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Clusters: 2, Function: perform_fuzzy_clustering, m: 3 test set"),
            "clusters-2-function-perform-fuzzy-clustering-m-3-test-set"
        );
        assert_eq!(slugify("Default diagnoses"), "default-diagnoses");
    }

    #[test]
    fn test_timer_monotonic() {
        let t = Timer::start();
        assert!(t.elapsed_ms() >= 0.0);
    }
}
