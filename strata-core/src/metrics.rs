//! # Metrics
//!
//! Lightweight atomic counters for monitoring ingestion and query volume.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector, cheap to clone and share across components.
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    records_ingested: AtomicU64,
    ingestion_errors: AtomicU64,
    persistence_retries: AtomicU64,
    queries_executed: AtomicU64,
    query_errors: AtomicU64,
    comparisons_run: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingestion(&self, count: u64) {
        self.inner.records_ingested.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_ingestion_error(&self) {
        self.inner.ingestion_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_retry(&self) {
        self.inner.persistence_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query(&self) {
        self.inner.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_error(&self) {
        self.inner.query_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_comparison(&self) {
        self.inner.comparisons_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_ingested: self.inner.records_ingested.load(Ordering::Relaxed),
            ingestion_errors: self.inner.ingestion_errors.load(Ordering::Relaxed),
            persistence_retries: self.inner.persistence_retries.load(Ordering::Relaxed),
            queries_executed: self.inner.queries_executed.load(Ordering::Relaxed),
            query_errors: self.inner.query_errors.load(Ordering::Relaxed),
            comparisons_run: self.inner.comparisons_run.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_ingested: u64,
    pub ingestion_errors: u64,
    pub persistence_retries: u64,
    pub queries_executed: u64,
    pub query_errors: u64,
    pub comparisons_run: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1_000.0
    }

    /// Stop the timer and log the duration.
    pub fn stop(self) -> f64 {
        let elapsed_ms = self.elapsed_ms();
        tracing::debug!(name = self.name, elapsed_ms, "operation completed");
        elapsed_ms
    }
}
