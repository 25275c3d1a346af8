//! # Exact Strategy (Brute-Force Scan)
//!
//! Scans every record and keeps a bounded top-k, O(n log k). No auxiliary
//! structure; 100% recall by construction, so it doubles as the ground
//! truth the other strategies are measured against. Charge is
//! proportional to the number of records scanned.

use strata_core::config::CostModel;
use strata_core::error::Result;
use strata_core::types::{MetadataFilter, VectorRecord};

use crate::collection::{Collection, UpsertOutcome};
use crate::rank::{to_results, Candidate, SearchOutcome, TopK};

pub struct ExactIndex {
    cost: CostModel,
}

impl ExactIndex {
    pub fn new(cost: CostModel) -> Self {
        Self { cost }
    }

    /// O(1): the collection append is the whole insert.
    pub fn insert(&self, _outcome: &UpsertOutcome, _record: &VectorRecord) -> Result<f64> {
        Ok(self.cost.cost_per_comparison)
    }

    pub fn query(
        &self,
        collection: &Collection,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<SearchOutcome> {
        collection.validate_dimensions(query)?;
        let metric = collection.metric().clone();
        let records = collection.records();

        let mut topk = TopK::new(k);
        for (position, record) in records.iter().enumerate() {
            // Predicate first: a filtered-out record costs no distance work.
            if let Some(filter) = filter {
                if !filter.matches(&record.metadata) {
                    continue;
                }
            }
            let score = metric.distance(query, &record.vector)?;
            topk.push(Candidate {
                score,
                id: &record.id,
                position,
            });
        }

        let unit_cost = records.len() as f64 * self.cost.cost_per_comparison;
        Ok(SearchOutcome {
            results: to_results(topk.into_sorted(), &records),
            unit_cost,
        })
    }
}
