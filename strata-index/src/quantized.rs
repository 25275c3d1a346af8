//! # Quantized Strategy (SQ8 Scan)
//!
//! Compresses vectors to one signed byte per component (fixed scale 127
//! over [-1, 1] after L2 normalization) and scans the code column with an
//! integer dot product. Per-comparison work is cheaper than the exact
//! scan, reflected by a configurable cost discount.
//!
//! With `rerank_enabled` the scan keeps a window of `m = k * multiplier`
//! candidates, reranks them at full precision against the collection's
//! stored vectors and truncates to k; recall then matches the exact
//! strategy on that window.

use parking_lot::RwLock;

use strata_core::config::{CostModel, QuantizedConfig};
use strata_core::error::Result;
use strata_core::types::{MetadataFilter, VectorRecord};

use crate::collection::{Collection, UpsertOutcome};
use crate::math::{dot_sq8, normalized, quantize_sq8, SQ8_SCALE};
use crate::rank::{to_results, Candidate, SearchOutcome, TopK};

pub struct QuantizedIndex {
    config: QuantizedConfig,
    cost: CostModel,
    dimensionality: usize,
    /// Code column: codes[i*dim..(i+1)*dim] belongs to record position i.
    codes: RwLock<Vec<i8>>,
}

impl QuantizedIndex {
    pub fn new(config: QuantizedConfig, cost: CostModel, dimensionality: usize) -> Self {
        Self {
            config,
            cost,
            dimensionality,
            codes: RwLock::new(Vec::new()),
        }
    }

    /// Quantize and store the code row for this record position. On an
    /// upsert replacement the row is overwritten in place.
    pub fn insert(&self, outcome: &UpsertOutcome, record: &VectorRecord) -> Result<f64> {
        let quantized = quantize_sq8(&normalized(&record.vector));
        let dim = self.dimensionality;
        let mut codes = self.codes.write();
        let needed = (outcome.position + 1) * dim;
        if codes.len() < needed {
            codes.resize(needed, 0);
        }
        codes[outcome.position * dim..needed].copy_from_slice(&quantized);
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
        let query_codes = quantize_sq8(&normalized(query));
        let dim = self.dimensionality;

        let records = collection.records();
        let codes = self.codes.read();
        let scanned = records.len().min(codes.len() / dim);

        let window = if self.config.rerank_enabled {
            k.saturating_mul(self.config.rerank_multiplier)
        } else {
            k
        };

        let mut topk = TopK::new(window);
        for position in 0..scanned {
            let record = &records[position];
            if let Some(filter) = filter {
                if !filter.matches(&record.metadata) {
                    continue;
                }
            }
            let row = &codes[position * dim..(position + 1) * dim];
            let dot = f64::from(dot_sq8(&query_codes, row));
            // Rounding can push a near-identical pair past 1.0; clamp so
            // scores stay in the metric's [0, 2] range.
            let score = (1.0 - dot / (SQ8_SCALE * SQ8_SCALE)).max(0.0);
            topk.push(Candidate {
                score,
                id: &record.id,
                position,
            });
        }

        let mut unit_cost = scanned as f64 * self.cost.cost_per_comparison * self.config.cost_factor;
        let candidates = topk.into_sorted();

        let results = if self.config.rerank_enabled {
            let metric = collection.metric().clone();
            unit_cost += candidates.len() as f64 * self.cost.cost_per_comparison;
            let mut reranked = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let record = &records[candidate.position];
                let score = metric.distance(query, &record.vector)?;
                reranked.push(Candidate { score, ..candidate });
            }
            reranked.sort_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(b.id))
            });
            reranked.truncate(k);
            to_results(reranked, &records)
        } else {
            to_results(candidates, &records)
        };

        Ok(SearchOutcome { results, unit_cost })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::CosineDistance;
    use std::sync::Arc;
    use strata_core::types::Metadata;

    fn setup(config: QuantizedConfig) -> (Collection, QuantizedIndex) {
        let collection = Collection::new("sq8-test", 4, Arc::new(CosineDistance));
        let index = QuantizedIndex::new(config, CostModel::default(), 4);
        (collection, index)
    }

    fn insert(collection: &Collection, index: &QuantizedIndex, id: &str, vector: Vec<f32>) {
        let record = VectorRecord::new(id, "doc", vector, "", Metadata::new()).unwrap();
        let outcome = collection.upsert(record.clone()).unwrap();
        index.insert(&outcome, &record).unwrap();
    }

    #[test]
    fn basis_vectors_rank_exactly() {
        let (collection, index) = setup(QuantizedConfig::default());
        insert(&collection, &index, "a", vec![1.0, 0.0, 0.0, 0.0]);
        insert(&collection, &index, "b", vec![0.0, 1.0, 0.0, 0.0]);
        insert(&collection, &index, "c", vec![1.0, 1.0, 1.0, 1.0]);

        let outcome = index
            .query(&collection, &[1.0, 0.0, 0.0, 0.0], 1, None)
            .unwrap();
        assert_eq!(outcome.results[0].record_id, "a");
        assert!(outcome.results[0].score < 0.05);
    }

    #[test]
    fn quantized_scan_is_discounted() {
        let (collection, index) = setup(QuantizedConfig::default());
        for i in 0..8 {
            insert(&collection, &index, &format!("r{i}"), vec![i as f32, 1.0, 0.5, 0.0]);
        }
        let outcome = index
            .query(&collection, &[1.0, 0.0, 0.0, 0.0], 2, None)
            .unwrap();
        // 8 records at the default 0.25 discount.
        assert_eq!(outcome.unit_cost, 2.0);
    }

    #[test]
    fn rerank_scores_at_full_precision() {
        let config = QuantizedConfig {
            rerank_enabled: true,
            ..Default::default()
        };
        let (collection, index) = setup(config);
        insert(&collection, &index, "a", vec![1.0, 0.0, 0.0, 0.0]);
        insert(&collection, &index, "b", vec![0.9, 0.1, 0.0, 0.0]);
        insert(&collection, &index, "c", vec![0.0, 0.0, 1.0, 0.0]);

        let outcome = index
            .query(&collection, &[1.0, 0.0, 0.0, 0.0], 2, None)
            .unwrap();
        assert_eq!(outcome.results[0].record_id, "a");
        // Full-precision rerank: the self-match is exactly zero.
        assert_eq!(outcome.results[0].score, 0.0);
        assert_eq!(outcome.results[1].record_id, "b");
    }

    #[test]
    fn upsert_overwrites_code_row() {
        let (collection, index) = setup(QuantizedConfig::default());
        insert(&collection, &index, "a", vec![1.0, 0.0, 0.0, 0.0]);
        insert(&collection, &index, "a", vec![0.0, 1.0, 0.0, 0.0]);

        let outcome = index
            .query(&collection, &[0.0, 1.0, 0.0, 0.0], 1, None)
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].record_id, "a");
        assert!(outcome.results[0].score < 0.05);
    }
}
