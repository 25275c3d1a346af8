//! # Similarity Metric
//!
//! The distance seam between collections and strategies. Cosine is the
//! required implementation; other metrics plug in behind the same trait.

use std::sync::Arc;

use strata_core::config::MetricKind;
use strata_core::error::{Error, Result};

use crate::math;

/// Pluggable distance function. Distances are `f64`, lower = more
/// similar; implementations must be commutative.
pub trait SimilarityMetric: Send + Sync {
    fn name(&self) -> &'static str;

    /// Distance between two vectors of equal length.
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64>;
}

/// Cosine distance, range [0, 2]. A zero-magnitude operand yields `0.0`
/// by convention, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl SimilarityMetric for CosineDistance {
    fn name(&self) -> &'static str {
        "cosine"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(math::cosine_distance(a, b))
    }
}

/// Resolve a metric implementation from configuration.
pub fn metric_for(kind: MetricKind) -> Arc<dyn SimilarityMetric> {
    match kind {
        MetricKind::Cosine => Arc::new(CosineDistance),
    }
}
