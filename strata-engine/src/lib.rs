//! # Strata Engine
//!
//! Orchestration layer of the Strata vector store: the strategy registry,
//! the concurrent ingestion pipeline, the query executor with its
//! comparison harness, and the persistence port.
//!
//! ## Control flow
//!
//! ```text
//! caller ─▶ IngestionPipeline ─▶ StrategyRegistry ─▶ IndexStrategy ─▶ Collection
//! caller ─▶ QueryExecutor/compare ─▶ StrategyRegistry ─▶ IndexStrategy ─▶ ranked results
//! ```
//!
//! No component holds multi-step session state; every operation is a pure
//! request/response over owned data. The only lifecycle is a strategy's
//! monotonic `unregistered → registered → populated`.

pub mod executor;
pub mod persistence;
pub mod pipeline;
pub mod registry;

pub use executor::{ComparisonReport, QueryExecutor, StrategyComparison};
pub use persistence::{FileStore, MemoryStore, PersistencePort};
pub use pipeline::{BulkLoadReport, CancelToken, IngestionPipeline, RecordFailure, StrategyLoadStats};
pub use registry::{StrategyEntry, StrategyRegistry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
