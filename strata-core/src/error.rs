//! # Error Handling
//!
//! Error taxonomy for Strata operations.
//!
//! Two families of failures exist and callers must be able to tell them
//! apart:
//!
//! 1. **Usage errors** (`DuplicateStrategy`, `UnknownStrategy`,
//!    `InvalidArgument`, `RegistryBusy`) are fatal to the single call and
//!    returned immediately.
//! 2. **Per-item errors** (`DimensionMismatch` on one record of a batch,
//!    `Persistence` after retries) are recovered locally into reports so
//!    partial success stays a first-class outcome.

use thiserror::Error;

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Primary error type for Strata
#[derive(Error, Debug)]
pub enum Error {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("strategy already registered: {name}")]
    DuplicateStrategy { name: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("registry busy: {operation} rejected while a bulk load is in flight")]
    RegistryBusy { operation: String },

    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// True for programmer-usage errors that are fatal to the call and
    /// must never be retried or folded into a partial-success report.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument { .. }
                | Error::DuplicateStrategy { .. }
                | Error::UnknownStrategy { .. }
                | Error::RegistryBusy { .. }
        )
    }

    /// True if the pipeline may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Persistence { .. })
    }

    /// Stable error code for monitoring
    pub fn code(&self) -> &'static str {
        match self {
            Error::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Error::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Error::DuplicateStrategy { .. } => "DUPLICATE_STRATEGY",
            Error::UnknownStrategy { .. } => "UNKNOWN_STRATEGY",
            Error::RegistryBusy { .. } => "REGISTRY_BUSY",
            Error::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }

    /// Wrap an underlying store failure, keeping the cause.
    pub fn persistence(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Persistence failure with no distinct underlying cause.
    pub fn persistence_msg(message: impl Into<String>) -> Self {
        Error::Persistence {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
