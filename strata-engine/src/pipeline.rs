//! # Ingestion Pipeline
//!
//! Loads batches of records into every registered strategy with bounded
//! concurrency. Worker threads pull records from a shared cursor; one
//! record's fan-out to all strategies happens inside one worker so cost
//! attribution stays simple.
//!
//! Failures are isolated per record: a bad record lands in the report and
//! the batch keeps going. A cancelled load lets in-flight records finish,
//! dispatches nothing new and marks the report `cancelled`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use strata_core::config::PipelineConfig;
use strata_core::error::{Error, Result};
use strata_core::metrics::Metrics;
use strata_core::types::{OperationCost, VectorRecord};

use crate::persistence::PersistencePort;
use crate::registry::{StrategyEntry, StrategyRegistry};

/// Cooperative cancellation signal shared between the caller and the
/// pipeline's workers.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-strategy ingestion totals. Sums are commutative, so totals are
/// deterministic regardless of worker scheduling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrategyLoadStats {
    pub succeeded: usize,
    pub failed: usize,
    pub unit_cost: f64,
}

/// One failed (record, strategy) application.
#[derive(Debug)]
pub struct RecordFailure {
    pub record_id: String,
    pub strategy: String,
    pub error: Error,
}

/// Outcome of a bulk load. `succeeded + failed` can be less than
/// `submitted` after a cancellation. The failure list's order is
/// scheduling-dependent and carries no guarantee.
#[derive(Debug, Default)]
pub struct BulkLoadReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub per_strategy: BTreeMap<String, StrategyLoadStats>,
    pub failures: Vec<RecordFailure>,
}

impl BulkLoadReport {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

pub struct IngestionPipeline {
    registry: Arc<StrategyRegistry>,
    port: Arc<dyn PersistencePort>,
    config: PipelineConfig,
    metrics: Metrics,
}

impl IngestionPipeline {
    pub fn new(
        registry: Arc<StrategyRegistry>,
        port: Arc<dyn PersistencePort>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let metrics = registry.metrics().clone();
        Ok(Self {
            registry,
            port,
            config,
            metrics,
        })
    }

    /// Bulk load with the configured worker bound.
    pub fn bulk_load(
        &self,
        records: Vec<VectorRecord>,
        cancel: &CancelToken,
    ) -> Result<BulkLoadReport> {
        self.bulk_load_with(records, self.config.max_workers, cancel)
    }

    /// Bulk load with an explicit worker bound. `max_workers` caps
    /// concurrently in-flight records, not per-strategy work.
    pub fn bulk_load_with(
        &self,
        records: Vec<VectorRecord>,
        max_workers: usize,
        cancel: &CancelToken,
    ) -> Result<BulkLoadReport> {
        if max_workers == 0 {
            return Err(Error::invalid_argument("max_workers must be >= 1"));
        }
        // Blocks registration for the duration of the load.
        let _load = self.registry.begin_load();
        let entries = self.registry.entries();

        let submitted = records.len();
        let mut accumulator = Accumulator::default();
        for entry in &entries {
            accumulator
                .per_strategy
                .insert(entry.name().to_string(), StrategyLoadStats::default());
        }
        let accumulator = Mutex::new(accumulator);
        let cursor = AtomicUsize::new(0);
        let workers = max_workers.min(submitted.max(1));

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let next = cursor.fetch_add(1, Ordering::SeqCst);
                    if next >= records.len() {
                        break;
                    }
                    let outcome = self.load_record(&entries, &records[next]);
                    self.merge(&accumulator, &records[next], outcome);
                });
            }
        });

        let accumulator = accumulator.into_inner();
        let report = BulkLoadReport {
            submitted,
            succeeded: accumulator.succeeded,
            failed: accumulator.failed,
            cancelled: cancel.is_cancelled(),
            per_strategy: accumulator.per_strategy,
            failures: accumulator.failures,
        };
        tracing::info!(
            submitted,
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            "bulk load finished"
        );
        Ok(report)
    }

    /// Rehydrate every registered strategy from the persistence port.
    /// Returns the number of records restored; unreadable records are
    /// skipped with a warning.
    pub fn reload(&self, cancel: &CancelToken) -> Result<usize> {
        let _load = self.registry.begin_load();
        let mut restored = 0usize;
        for entry in self.registry.entries() {
            let records = self.port.load_all(entry.name())?;
            for record in records {
                if cancel.is_cancelled() {
                    return Ok(restored);
                }
                match entry.insert(&record) {
                    Ok(_) => restored += 1,
                    Err(err) => tracing::warn!(
                        strategy = entry.name(),
                        record_id = %record.id,
                        error = %err,
                        "skipping record during reload"
                    ),
                }
            }
        }
        Ok(restored)
    }

    /// Fan one record out to every strategy, persisting before indexing.
    fn load_record(
        &self,
        entries: &[Arc<StrategyEntry>],
        record: &VectorRecord,
    ) -> Vec<(String, Result<f64>)> {
        entries
            .iter()
            .map(|entry| (entry.name().to_string(), self.apply(entry, record)))
            .collect()
    }

    fn apply(&self, entry: &StrategyEntry, record: &VectorRecord) -> Result<f64> {
        // Reject bad dimensions before anything reaches the store.
        entry.collection().validate_dimensions(&record.vector)?;
        let persisted = self.save_with_retries(entry.name(), record)?;
        let insert_cost = entry.insert(record)?;
        Ok(persisted.unit_cost + insert_cost)
    }

    fn save_with_retries(&self, collection: &str, record: &VectorRecord) -> Result<OperationCost> {
        let mut attempt = 0u32;
        loop {
            match self.port.save(collection, record) {
                Ok(cost) => return Ok(cost),
                Err(err) if err.is_retryable() && attempt < self.config.persistence_retries => {
                    attempt += 1;
                    self.metrics.record_persistence_retry();
                    tracing::warn!(
                        collection,
                        record_id = %record.id,
                        attempt,
                        error = %err,
                        "persistence write failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn merge(
        &self,
        accumulator: &Mutex<Accumulator>,
        record: &VectorRecord,
        outcome: Vec<(String, Result<f64>)>,
    ) {
        let mut guard = accumulator.lock();
        let accumulator = &mut *guard;
        let mut record_failed = false;
        for (strategy, result) in outcome {
            let stats = accumulator.per_strategy.entry(strategy.clone()).or_default();
            match result {
                Ok(unit_cost) => {
                    stats.succeeded += 1;
                    stats.unit_cost += unit_cost;
                }
                Err(error) => {
                    stats.failed += 1;
                    record_failed = true;
                    accumulator.failures.push(RecordFailure {
                        record_id: record.id.clone(),
                        strategy,
                        error,
                    });
                }
            }
        }
        if record_failed {
            accumulator.failed += 1;
            self.metrics.record_ingestion_error();
        } else {
            accumulator.succeeded += 1;
            self.metrics.record_ingestion(1);
        }
    }
}

#[derive(Default)]
struct Accumulator {
    succeeded: usize,
    failed: usize,
    per_strategy: BTreeMap<String, StrategyLoadStats>,
    failures: Vec<RecordFailure>,
}
