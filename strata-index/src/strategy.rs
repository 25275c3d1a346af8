//! # Strategy Dispatch
//!
//! Closed tagged variant over the three index strategies, dispatched
//! through one surface. Adding a strategy means one new variant and one
//! arm per operation; no scattered conditionals.

use strata_core::config::{StrategyConfig, StrategyKind};
use strata_core::error::Result;
use strata_core::types::{MetadataFilter, VectorRecord};

use crate::approximate::ApproximateIndex;
use crate::collection::{Collection, UpsertOutcome};
use crate::exact::ExactIndex;
use crate::quantized::QuantizedIndex;
use crate::rank::SearchOutcome;

pub enum IndexStrategy {
    Exact(ExactIndex),
    Quantized(QuantizedIndex),
    Approximate(ApproximateIndex),
}

impl IndexStrategy {
    /// Build the strategy a config names. Validates the config first so a
    /// bad registration never constructs partial state.
    pub fn from_config(config: &StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(match config.kind {
            StrategyKind::Exact => IndexStrategy::Exact(ExactIndex::new(config.cost.clone())),
            StrategyKind::Quantized => IndexStrategy::Quantized(QuantizedIndex::new(
                config.quantized.clone(),
                config.cost.clone(),
                config.dimensionality,
            )),
            StrategyKind::Approximate => IndexStrategy::Approximate(ApproximateIndex::new(
                config.approximate.clone(),
                config.cost.clone(),
                config.dimensionality,
            )),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            IndexStrategy::Exact(_) => StrategyKind::Exact,
            IndexStrategy::Quantized(_) => StrategyKind::Quantized,
            IndexStrategy::Approximate(_) => StrategyKind::Approximate,
        }
    }

    /// Update derived structures for a record the collection just
    /// accepted. Returns the insert's abstract charge.
    pub fn insert(&self, outcome: &UpsertOutcome, record: &VectorRecord) -> Result<f64> {
        match self {
            IndexStrategy::Exact(index) => index.insert(outcome, record),
            IndexStrategy::Quantized(index) => index.insert(outcome, record),
            IndexStrategy::Approximate(index) => index.insert(outcome, record),
        }
    }

    pub fn query(
        &self,
        collection: &Collection,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<SearchOutcome> {
        match self {
            IndexStrategy::Exact(index) => index.query(collection, query, k, filter),
            IndexStrategy::Quantized(index) => index.query(collection, query, k, filter),
            IndexStrategy::Approximate(index) => index.query(collection, query, k, filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_configured_kind() {
        for kind in [
            StrategyKind::Exact,
            StrategyKind::Quantized,
            StrategyKind::Approximate,
        ] {
            let config = StrategyConfig::new("s", kind, 8);
            let strategy = IndexStrategy::from_config(&config).unwrap();
            assert_eq!(strategy.kind(), kind);
        }
    }

    #[test]
    fn invalid_config_never_constructs() {
        let mut config = StrategyConfig::new("s", StrategyKind::Approximate, 8);
        config.approximate.expected_recall = 2.0;
        assert!(IndexStrategy::from_config(&config).is_err());
    }
}
