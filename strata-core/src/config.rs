//! # Configuration
//!
//! Configuration for strategies, the ingestion pipeline and the cost
//! model. All options are plain serde structs so a host can wire them from
//! JSON; every struct has workable defaults and a `validate()` that turns
//! misuse into `InvalidArgument` before any state is touched.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Indexing strategy kinds. Adding a strategy means adding a variant here
/// and one arm in the index dispatch, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Exact,
    Quantized,
    Approximate,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Exact => "exact",
            StrategyKind::Quantized => "quantized",
            StrategyKind::Approximate => "approximate",
        }
    }
}

/// Distance metric selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cosine,
}

impl Default for MetricKind {
    fn default() -> Self {
        MetricKind::Cosine
    }
}

/// Per-strategy registration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub kind: StrategyKind,
    pub dimensionality: usize,
    #[serde(default)]
    pub metric: MetricKind,
    #[serde(default)]
    pub quantized: QuantizedConfig,
    #[serde(default)]
    pub approximate: ApproximateConfig,
    #[serde(default)]
    pub cost: CostModel,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>, kind: StrategyKind, dimensionality: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            dimensionality,
            metric: MetricKind::default(),
            quantized: QuantizedConfig::default(),
            approximate: ApproximateConfig::default(),
            cost: CostModel::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_argument("strategy name must not be empty"));
        }
        if self.dimensionality == 0 {
            return Err(Error::invalid_argument("dimensionality must be >= 1"));
        }
        match self.kind {
            StrategyKind::Quantized => self.quantized.validate(),
            StrategyKind::Approximate => self.approximate.validate(),
            StrategyKind::Exact => Ok(()),
        }
    }
}

/// Quantized-strategy options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizedConfig {
    /// Rerank the top candidates at full precision before truncating to k.
    pub rerank_enabled: bool,
    /// Rerank window size as a multiple of k (window m = k * multiplier).
    pub rerank_multiplier: usize,
    /// Per-comparison cost discount relative to the exact scan. A
    /// configurable multiplier, not a hardware-measured value.
    pub cost_factor: f64,
}

impl Default for QuantizedConfig {
    fn default() -> Self {
        Self {
            rerank_enabled: false,
            rerank_multiplier: 4,
            cost_factor: 0.25,
        }
    }
}

impl QuantizedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rerank_enabled && self.rerank_multiplier < 2 {
            return Err(Error::invalid_argument(
                "rerank_multiplier must be >= 2 so the rerank window exceeds k",
            ));
        }
        if !(self.cost_factor > 0.0 && self.cost_factor <= 1.0) {
            return Err(Error::invalid_argument("cost_factor must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Approximate-strategy (LSH) options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproximateConfig {
    /// Documented recall target, validated by recall tests only.
    pub expected_recall: f64,
    /// Number of random hyperplanes; bucket space is 2^hyperplanes.
    pub hyperplanes: usize,
    /// Maximum number of buckets probed per query.
    pub probe_budget: usize,
    /// Seed for the projection RNG. Fixed seed => deterministic results.
    pub seed: u64,
}

impl Default for ApproximateConfig {
    fn default() -> Self {
        Self {
            expected_recall: 0.95,
            hyperplanes: 8,
            probe_budget: 24,
            seed: 0x5742_a11e,
        }
    }
}

impl ApproximateConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.expected_recall > 0.0 && self.expected_recall <= 1.0) {
            return Err(Error::invalid_argument("expected_recall must be in (0, 1]"));
        }
        if self.hyperplanes == 0 || self.hyperplanes > 32 {
            return Err(Error::invalid_argument("hyperplanes must be in 1..=32"));
        }
        if self.probe_budget == 0 {
            return Err(Error::invalid_argument("probe_budget must be >= 1"));
        }
        Ok(())
    }
}

/// Abstract charge model used to attribute work to operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    /// Charge units per distance comparison in an exact scan.
    pub cost_per_comparison: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            cost_per_comparison: 1.0,
        }
    }
}

/// Ingestion pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bound on concurrently in-flight records (not per-strategy).
    pub max_workers: usize,
    /// Retries for a failed persistence write before the record counts as
    /// failed. No backoff; retry policy beyond the bound is the host's.
    pub persistence_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            persistence_retries: 2,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::invalid_argument("max_workers must be >= 1"));
        }
        Ok(())
    }
}

/// Top-level engine configuration a host can load from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| Error::invalid_argument(format!("bad engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        for strategy in &self.strategies {
            strategy.validate()?;
        }
        Ok(())
    }
}
