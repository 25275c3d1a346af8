//! # Query Executor and Comparison Harness
//!
//! Issues similarity queries against one strategy or all of them. The
//! comparison harness is the payoff of registering several strategies:
//! the same query runs everywhere and comes back as a side-by-side report
//! of result sets, cost and latency.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;

use strata_core::error::{Error, Result};
use strata_core::metrics::{Metrics, Timer};
use strata_core::types::{MetadataFilter, OperationCost, QueryResult};

use crate::registry::{StrategyEntry, StrategyRegistry};

pub struct QueryExecutor {
    registry: Arc<StrategyRegistry>,
    metrics: Metrics,
}

impl QueryExecutor {
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        let metrics = registry.metrics().clone();
        Self { registry, metrics }
    }

    /// Query one strategy. Results come back ranked ascending by score
    /// with the measured cost and latency attached.
    pub fn query_one(
        &self,
        strategy: &str,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<(Vec<QueryResult>, OperationCost)> {
        validate_k(k)?;
        let entry = self.registry.get(strategy)?;
        self.run(&entry, vector, k, filter)
    }

    /// Run the same query against every registered strategy. A failure in
    /// one strategy is captured in its row and the others still complete.
    pub fn compare(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<ComparisonReport> {
        validate_k(k)?;
        self.metrics.record_comparison();
        let entries = self.registry.entries();
        let rows = entries
            .par_iter()
            .map(|entry| {
                let row = match self.run(entry, vector, k, filter) {
                    Ok((results, cost)) => StrategyComparison {
                        results,
                        cost,
                        error: None,
                    },
                    Err(error) => StrategyComparison {
                        results: Vec::new(),
                        cost: OperationCost::zero(),
                        error: Some(error),
                    },
                };
                (entry.name().to_string(), row)
            })
            .collect();
        Ok(ComparisonReport { rows })
    }

    fn run(
        &self,
        entry: &StrategyEntry,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<(Vec<QueryResult>, OperationCost)> {
        let timer = Timer::start("query");
        match entry.strategy().query(entry.collection(), vector, k, filter) {
            Ok(outcome) => {
                self.metrics.record_query();
                let cost = OperationCost::new(outcome.unit_cost, timer.elapsed_ms());
                tracing::debug!(
                    strategy = entry.name(),
                    k,
                    results = outcome.results.len(),
                    unit_cost = cost.unit_cost,
                    elapsed_ms = cost.elapsed_ms,
                    "query completed"
                );
                Ok((outcome.results, cost))
            }
            Err(err) => {
                self.metrics.record_query_error();
                Err(err)
            }
        }
    }
}

fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::invalid_argument("k must be >= 1"));
    }
    Ok(())
}

/// One strategy's row in a comparison.
#[derive(Debug)]
pub struct StrategyComparison {
    pub results: Vec<QueryResult>,
    pub cost: OperationCost,
    pub error: Option<Error>,
}

/// Side-by-side outcome of running one query against every strategy.
#[derive(Debug, Default)]
pub struct ComparisonReport {
    pub rows: BTreeMap<String, StrategyComparison>,
}

impl ComparisonReport {
    /// Fraction of the baseline's result ids each strategy recovered.
    /// An empty baseline result set counts as full recall.
    pub fn recall_relative_to(&self, baseline: &str) -> Result<BTreeMap<String, f64>> {
        let base = self.rows.get(baseline).ok_or_else(|| Error::UnknownStrategy {
            name: baseline.into(),
        })?;
        let base_ids: HashSet<&str> = base
            .results
            .iter()
            .map(|r| r.record_id.as_str())
            .collect();
        let recall = |row: &StrategyComparison| {
            if base_ids.is_empty() {
                return 1.0;
            }
            let hits = row
                .results
                .iter()
                .filter(|r| base_ids.contains(r.record_id.as_str()))
                .count();
            hits as f64 / base_ids.len() as f64
        };
        Ok(self
            .rows
            .iter()
            .map(|(name, row)| (name.clone(), recall(row)))
            .collect())
    }
}
