//! # Core Types
//!
//! The unit of storage (`VectorRecord`), query outputs (`QueryResult`),
//! per-operation accounting (`OperationCost`) and metadata predicates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp type used throughout the system
pub type Timestamp = DateTime<Utc>;

/// Metadata attached to a record. Ordered map so snapshots render
/// deterministically; insertion order is irrelevant.
pub type Metadata = BTreeMap<String, String>;

/// A vector embedding plus its payload, the unit of storage.
///
/// `id` is unique within a Collection. `partition_key` groups records for
/// the persistence layer and carries no meaning inside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub partition_key: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: Metadata,
    pub created_at: Timestamp,
}

impl VectorRecord {
    pub fn new(
        id: impl Into<String>,
        partition_key: impl Into<String>,
        vector: Vec<f32>,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_argument("record id must not be empty"));
        }
        if vector.is_empty() {
            return Err(Error::invalid_argument("record vector must not be empty"));
        }
        Ok(Self {
            id,
            partition_key: partition_key.into(),
            vector,
            content: content.into(),
            metadata,
            created_at: Utc::now(),
        })
    }

    pub fn dimensionality(&self) -> usize {
        self.vector.len()
    }
}

/// One ranked hit from a similarity query.
///
/// `score` is a distance: lower means more similar. For cosine the range
/// is [0, 2]. Result lists are sorted ascending by score with ties broken
/// by `record_id` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub record_id: String,
    pub score: f64,
    pub content: String,
    pub metadata: Metadata,
}

/// Abstract charge and latency attached to every ingestion and query
/// outcome. Never mutated after creation; combining two costs produces a
/// new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationCost {
    /// Abstract charge units consumed (>= 0)
    pub unit_cost: f64,
    /// Wall-clock time spent (>= 0)
    pub elapsed_ms: f64,
}

impl OperationCost {
    pub fn new(unit_cost: f64, elapsed_ms: f64) -> Self {
        Self {
            unit_cost: unit_cost.max(0.0),
            elapsed_ms: elapsed_ms.max(0.0),
        }
    }

    pub fn zero() -> Self {
        Self {
            unit_cost: 0.0,
            elapsed_ms: 0.0,
        }
    }

    /// Commutative sum, so aggregated totals are deterministic regardless
    /// of scheduling order.
    pub fn combined(self, other: OperationCost) -> Self {
        Self {
            unit_cost: self.unit_cost + other.unit_cost,
            elapsed_ms: self.elapsed_ms + other.elapsed_ms,
        }
    }
}

/// Equality predicate over record metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub field: String,
    pub value: String,
}

impl MetadataFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let field = field.into();
        if field.is_empty() {
            return Err(Error::invalid_argument("filter field must not be empty"));
        }
        Ok(Self {
            field,
            value: value.into(),
        })
    }

    /// Parse a `field=value` expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(Error::invalid_argument("filter expression must not be empty"));
        }
        match expr.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                Self::new(field.trim(), value.trim())
            }
            _ => Err(Error::invalid_argument(format!(
                "filter expression must be field=value, got {expr:?}"
            ))),
        }
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        metadata.get(&self.field).map(String::as_str) == Some(self.value.as_str())
    }
}
