//! # Approximate Strategy (Sign-Projection LSH)
//!
//! Sub-linear candidate generation: vectors hash into buckets by the sign
//! of their projection onto seeded random hyperplanes. A query probes its
//! own bucket and then near buckets (Hamming distance 1, then 2, in a
//! fixed bit order) up to the probe budget, and ranks the bounded
//! candidate set exactly with the collection metric.
//!
//! Deterministic for a fixed seed. `expected_recall` is a documented
//! target checked by the recall tests, not a per-query guarantee. The
//! strategy seam leaves room for a graph-based ANN engine with the same
//! contract.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strata_core::config::{ApproximateConfig, CostModel};
use strata_core::error::Result;
use strata_core::types::{MetadataFilter, VectorRecord};

use crate::collection::{Collection, UpsertOutcome};
use crate::math::dot;
use crate::rank::{to_results, Candidate, SearchOutcome, TopK};

pub struct ApproximateIndex {
    config: ApproximateConfig,
    cost: CostModel,
    dimensionality: usize,
    /// Concatenated hyperplanes: planes[i*dim..(i+1)*dim] is plane i.
    planes: Vec<f32>,
    /// Bucket key -> record positions in insertion order.
    buckets: RwLock<HashMap<u64, Vec<usize>>>,
}

impl ApproximateIndex {
    pub fn new(config: ApproximateConfig, cost: CostModel, dimensionality: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let planes = (0..config.hyperplanes * dimensionality)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        tracing::debug!(
            hyperplanes = config.hyperplanes,
            dimensionality,
            seed = config.seed,
            expected_recall = config.expected_recall,
            "lsh projections initialized"
        );
        Self {
            config,
            cost,
            dimensionality,
            planes,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    fn bucket_key(&self, vector: &[f32]) -> u64 {
        let dim = self.dimensionality;
        let mut key = 0u64;
        for plane in 0..self.config.hyperplanes {
            let projection = dot(&self.planes[plane * dim..(plane + 1) * dim], vector);
            if projection >= 0.0 {
                key |= 1 << plane;
            }
        }
        key
    }

    /// Probe order: own bucket, then Hamming-1 neighbors by ascending bit,
    /// then Hamming-2 pairs, truncated to the probe budget.
    fn probe_sequence(&self, key: u64) -> Vec<u64> {
        let bits = self.config.hyperplanes;
        let mut probes = Vec::with_capacity(self.config.probe_budget);
        probes.push(key);
        for i in 0..bits {
            if probes.len() == self.config.probe_budget {
                return probes;
            }
            probes.push(key ^ (1 << i));
        }
        for i in 0..bits {
            for j in (i + 1)..bits {
                if probes.len() == self.config.probe_budget {
                    return probes;
                }
                probes.push(key ^ (1 << i) ^ (1 << j));
            }
        }
        probes
    }

    /// Amortized sub-linear: one hash plus a bucket append. On an upsert
    /// replacement the stale position is evicted from its old bucket.
    pub fn insert(&self, outcome: &UpsertOutcome, record: &VectorRecord) -> Result<f64> {
        let key = self.bucket_key(&record.vector);
        let mut buckets = self.buckets.write();
        if let Some(old_vector) = &outcome.replaced {
            let old_key = self.bucket_key(old_vector);
            if let Some(bucket) = buckets.get_mut(&old_key) {
                bucket.retain(|&p| p != outcome.position);
            }
        }
        buckets.entry(key).or_default().push(outcome.position);
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
        let buckets = self.buckets.read();

        let mut examined = 0usize;
        let mut topk = TopK::new(k);
        for probe in self.probe_sequence(self.bucket_key(query)) {
            let Some(bucket) = buckets.get(&probe) else {
                continue;
            };
            for &position in bucket {
                if position >= records.len() {
                    continue;
                }
                let record = &records[position];
                if let Some(filter) = filter {
                    if !filter.matches(&record.metadata) {
                        continue;
                    }
                }
                examined += 1;
                let score = metric.distance(query, &record.vector)?;
                topk.push(Candidate {
                    score,
                    id: &record.id,
                    position,
                });
            }
        }

        Ok(SearchOutcome {
            results: to_results(topk.into_sorted(), &records),
            unit_cost: examined as f64 * self.cost.cost_per_comparison,
        })
    }

    pub fn expected_recall(&self) -> f64 {
        self.config.expected_recall
    }
}
