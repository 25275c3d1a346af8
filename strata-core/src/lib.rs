//! # Strata Core
//!
//! Fundamental building blocks for the Strata vector store:
//! - Core data structures (`VectorRecord`, `QueryResult`, `OperationCost`)
//! - Error taxonomy
//! - Configuration
//! - Metrics
//! - Record wire codec for the persistence port
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   strata-core                   │
//! ├─────────────────────────────────────────────────┤
//! │  • types    - records, results, costs, filters  │
//! │  • error    - error taxonomy                    │
//! │  • config   - strategy/pipeline configuration   │
//! │  • metrics  - atomic counters + timers          │
//! │  • codec    - binary record encode/decode       │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use config::{
    ApproximateConfig, CostModel, EngineConfig, MetricKind, PipelineConfig, QuantizedConfig,
    StrategyConfig, StrategyKind,
};
pub use error::{Error, Result};
pub use types::{Metadata, MetadataFilter, OperationCost, QueryResult, Timestamp, VectorRecord};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
