//! # Collection
//!
//! A fixed-dimensionality group of vector records sharing one similarity
//! metric. The collection owns the records; strategies own only derived
//! search structures. Dimensionality never changes after creation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use strata_core::error::{Error, Result};
use strata_core::types::VectorRecord;

use crate::metric::SimilarityMetric;

/// Result of an upsert: where the record landed and, if it replaced an
/// existing record with the same id, the old vector (strategies need it
/// to evict stale derived entries).
#[derive(Debug)]
pub struct UpsertOutcome {
    pub position: usize,
    pub replaced: Option<Vec<f32>>,
}

struct Store {
    records: Vec<VectorRecord>,
    /// record id -> position in `records`
    positions: HashMap<String, usize>,
}

pub struct Collection {
    name: String,
    dimensionality: usize,
    metric: Arc<dyn SimilarityMetric>,
    store: RwLock<Store>,
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        dimensionality: usize,
        metric: Arc<dyn SimilarityMetric>,
    ) -> Self {
        Self {
            name: name.into(),
            dimensionality,
            metric,
            store: RwLock::new(Store {
                records: Vec::new(),
                positions: HashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    pub fn metric(&self) -> &Arc<dyn SimilarityMetric> {
        &self.metric
    }

    pub fn len(&self) -> usize {
        self.store.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject vectors whose length does not match this collection.
    pub fn validate_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensionality {
            return Err(Error::DimensionMismatch {
                expected: self.dimensionality,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Insert a record, replacing any existing record with the same id.
    /// The append happens under one write lock so readers never observe a
    /// torn record. A dimension mismatch stores nothing.
    pub fn upsert(&self, record: VectorRecord) -> Result<UpsertOutcome> {
        self.validate_dimensions(&record.vector)?;
        let mut store = self.store.write();
        match store.positions.get(&record.id).copied() {
            Some(position) => {
                let old = std::mem::replace(&mut store.records[position], record);
                Ok(UpsertOutcome {
                    position,
                    replaced: Some(old.vector),
                })
            }
            None => {
                let position = store.records.len();
                store.positions.insert(record.id.clone(), position);
                store.records.push(record);
                Ok(UpsertOutcome {
                    position,
                    replaced: None,
                })
            }
        }
    }

    /// Read access to the record column for scan-style strategies.
    pub fn records(&self) -> MappedRwLockReadGuard<'_, Vec<VectorRecord>> {
        RwLockReadGuard::map(self.store.read(), |store| &store.records)
    }

    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        let store = self.store.read();
        store
            .positions
            .get(id)
            .map(|&position| store.records[position].clone())
    }

    /// Distinct values of a metadata field, sorted. Unknown fields yield
    /// an empty list, not an error.
    pub fn distinct_metadata_values(&self, field: &str) -> Vec<String> {
        let store = self.store.read();
        let mut values: Vec<String> = store
            .records
            .iter()
            .filter_map(|r| r.metadata.get(field).cloned())
            .collect();
        values.sort();
        values.dedup();
        values
    }
}
