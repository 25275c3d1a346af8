//! # Strategy Registry
//!
//! Owns one (Collection, IndexStrategy) pair per strategy name and routes
//! inserts to one or all of them. An explicit instance constructed by the
//! host; there is no process-wide state.
//!
//! Collections are never shared between strategies: every entry gets its
//! own copy of each inserted record, so cost and latency stay attributable
//! per strategy and one strategy's derived structures cannot corrupt
//! another's.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use strata_core::config::{EngineConfig, StrategyConfig};
use strata_core::error::{Error, Result};
use strata_core::metrics::{Metrics, Timer};
use strata_core::types::{OperationCost, VectorRecord};
use strata_index::{metric_for, Collection, IndexStrategy};

/// One registered strategy: its private collection, its index and the
/// exclusive insert lock that keeps the collection single-writer.
pub struct StrategyEntry {
    name: String,
    collection: Collection,
    strategy: IndexStrategy,
    insert_lock: Mutex<()>,
}

impl std::fmt::Debug for StrategyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl StrategyEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn strategy(&self) -> &IndexStrategy {
        &self.strategy
    }

    /// Apply one record: collection append plus derived-structure update
    /// under the entry's insert lock. Queries take only read locks and
    /// are not blocked by this lock.
    pub(crate) fn insert(&self, record: &VectorRecord) -> Result<f64> {
        let _guard = self.insert_lock.lock();
        let outcome = self.collection.upsert(record.clone())?;
        self.strategy.insert(&outcome, record)
    }
}

/// Registry lifecycle is monotonic: strategies are registered once and
/// live for the registry's lifetime.
pub struct StrategyRegistry {
    entries: RwLock<BTreeMap<String, Arc<StrategyEntry>>>,
    loads_in_flight: AtomicUsize,
    metrics: Metrics,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::with_metrics(Metrics::new())
    }

    pub fn with_metrics(metrics: Metrics) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            loads_in_flight: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Build a registry holding every strategy an engine config names.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let registry = Self::new();
        for strategy in &config.strategies {
            registry.register(strategy.clone())?;
        }
        Ok(registry)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Register a strategy under a unique name. Rejected with
    /// `RegistryBusy` while any bulk load is in flight.
    pub fn register(&self, config: StrategyConfig) -> Result<()> {
        let mut entries = self.entries.write();
        if self.loads_in_flight.load(Ordering::SeqCst) > 0 {
            return Err(Error::RegistryBusy {
                operation: "register".into(),
            });
        }
        if entries.contains_key(&config.name) {
            return Err(Error::DuplicateStrategy {
                name: config.name.clone(),
            });
        }
        let strategy = IndexStrategy::from_config(&config)?;
        let collection = Collection::new(
            config.name.clone(),
            config.dimensionality,
            metric_for(config.metric),
        );
        tracing::info!(
            name = %config.name,
            kind = config.kind.as_str(),
            dimensionality = config.dimensionality,
            "strategy registered"
        );
        entries.insert(
            config.name.clone(),
            Arc::new(StrategyEntry {
                name: config.name,
                collection,
                strategy,
                insert_lock: Mutex::new(()),
            }),
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<StrategyEntry>> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownStrategy { name: name.into() })
    }

    /// Snapshot of all entries in name order.
    pub fn entries(&self) -> Vec<Arc<StrategyEntry>> {
        self.entries.read().values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert one record into one strategy.
    pub fn insert_one(&self, name: &str, record: &VectorRecord) -> Result<OperationCost> {
        let entry = self.get(name)?;
        let timer = Timer::start("insert_one");
        match entry.insert(record) {
            Ok(unit_cost) => {
                self.metrics.record_ingestion(1);
                Ok(OperationCost::new(unit_cost, timer.stop()))
            }
            Err(err) => {
                self.metrics.record_ingestion_error();
                Err(err)
            }
        }
    }

    /// Apply the same logical record to every strategy. Failures are
    /// captured per strategy; the record must satisfy every collection's
    /// dimensionality to succeed everywhere.
    pub fn insert_all(&self, record: &VectorRecord) -> BTreeMap<String, Result<OperationCost>> {
        let mut results = BTreeMap::new();
        for entry in self.entries() {
            let timer = Timer::start("insert_all");
            let result = match entry.insert(record) {
                Ok(unit_cost) => {
                    self.metrics.record_ingestion(1);
                    Ok(OperationCost::new(unit_cost, timer.stop()))
                }
                Err(err) => {
                    self.metrics.record_ingestion_error();
                    Err(err)
                }
            };
            results.insert(entry.name().to_string(), result);
        }
        results
    }

    /// Record counts per strategy.
    pub fn record_counts(&self) -> BTreeMap<String, usize> {
        self.entries()
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry.collection().len()))
            .collect()
    }

    /// Mark a bulk load as in flight; registration is rejected until the
    /// returned guard drops.
    pub(crate) fn begin_load(&self) -> LoadGuard<'_> {
        // Taking the entries lock orders this against a concurrent
        // register() holding the write lock.
        let _entries = self.entries.read();
        self.loads_in_flight.fetch_add(1, Ordering::SeqCst);
        LoadGuard { registry: self }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct LoadGuard<'a> {
    registry: &'a StrategyRegistry,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.registry.loads_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::config::StrategyKind;
    use strata_core::types::Metadata;

    fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, "doc", vector, "", Metadata::new()).unwrap()
    }

    #[test]
    fn builds_from_engine_config() {
        let json = r#"{
            "strategies": [
                { "name": "exact", "kind": "exact", "dimensionality": 4 },
                { "name": "lsh", "kind": "approximate", "dimensionality": 4 }
            ]
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        let registry = StrategyRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec!["exact".to_string(), "lsh".to_string()]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = StrategyRegistry::new();
        registry
            .register(StrategyConfig::new("flat", StrategyKind::Exact, 4))
            .unwrap();
        let err = registry
            .register(StrategyConfig::new("flat", StrategyKind::Quantized, 4))
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_STRATEGY");
    }

    #[test]
    fn unknown_strategy_fails() {
        let registry = StrategyRegistry::new();
        assert_eq!(
            registry.get("missing").unwrap_err().code(),
            "UNKNOWN_STRATEGY"
        );
    }

    #[test]
    fn register_rejected_while_load_in_flight() {
        let registry = StrategyRegistry::new();
        registry
            .register(StrategyConfig::new("flat", StrategyKind::Exact, 4))
            .unwrap();
        {
            let _load = registry.begin_load();
            let err = registry
                .register(StrategyConfig::new("sq8", StrategyKind::Quantized, 4))
                .unwrap_err();
            assert_eq!(err.code(), "REGISTRY_BUSY");
        }
        // Guard dropped: registration works again.
        registry
            .register(StrategyConfig::new("sq8", StrategyKind::Quantized, 4))
            .unwrap();
    }

    #[test]
    fn insert_all_reports_per_strategy() {
        let registry = StrategyRegistry::new();
        registry
            .register(StrategyConfig::new("flat", StrategyKind::Exact, 4))
            .unwrap();
        registry
            .register(StrategyConfig::new("ann", StrategyKind::Approximate, 4))
            .unwrap();

        let results = registry.insert_all(&record("a", vec![1.0, 0.0, 0.0, 0.0]));
        assert_eq!(results.len(), 2);
        assert!(results.values().all(|r| r.is_ok()));
        assert_eq!(
            registry.record_counts(),
            BTreeMap::from([("ann".to_string(), 1), ("flat".to_string(), 1)])
        );
    }

    #[test]
    fn insert_one_counts_metrics() {
        let registry = StrategyRegistry::new();
        registry
            .register(StrategyConfig::new("flat", StrategyKind::Exact, 2))
            .unwrap();
        registry
            .insert_one("flat", &record("a", vec![1.0, 0.0]))
            .unwrap();
        assert!(registry.insert_one("flat", &record("b", vec![1.0])).is_err());

        let snap = registry.metrics().snapshot();
        assert_eq!(snap.records_ingested, 1);
        assert_eq!(snap.ingestion_errors, 1);
    }
}
