//! # Strata Index
//!
//! Vector math, the similarity-metric seam, record collections and the
//! three interchangeable index strategies.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      strata-index                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────┐   ┌───────────┐   ┌─────────────┐              │
//! │  │  Exact   │   │ Quantized │   │ Approximate │              │
//! │  │ (scan)   │   │  (SQ8)    │   │   (LSH)     │              │
//! │  └──────────┘   └───────────┘   └─────────────┘              │
//! │        │              │               │                      │
//! │        └──────────────┴───────────────┘                      │
//! │                       │                                      │
//! │            IndexStrategy (closed enum)                       │
//! │                       │                                      │
//! │        Collection ── SimilarityMetric ── math                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Strategies never own records; the `Collection` does. A strategy owns
//! only derived structures (code columns, hash buckets), each a pure
//! function of the collection's current records.

pub mod approximate;
pub mod collection;
pub mod exact;
pub mod math;
pub mod metric;
mod rank;
pub mod quantized;
pub mod strategy;

pub use approximate::ApproximateIndex;
pub use collection::{Collection, UpsertOutcome};
pub use exact::ExactIndex;
pub use metric::{metric_for, CosineDistance, SimilarityMetric};
pub use quantized::QuantizedIndex;
pub use rank::SearchOutcome;
pub use strategy::IndexStrategy;
