//! Error types for resource-stopper
//!
//! This module defines the error handling strategy for resource-stopper. There
//! are two error types: `StopperError` (main error enum) and `ConfigError`
//! (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `StopperError`.
//! The binary uses `anyhow::Result<T>` for top-level error handling. The
//! conversion happens at the CLI boundary using `anyhow::Error::from` so the
//! error chain is preserved.
//!
//! ## No Retries
//!
//! Provider errors are not retried anywhere. A failed list, tag lookup or stop
//! call aborts the workflow for that resource kind; the runner decides whether
//! the remaining kinds still run (see `runner.rs`).
//!
//! ## When to Use Which Error
//!
//! - `ConfigError`: unknown resource kinds, missing fields, unparsable files
//!   - Automatically converted to `StopperError::Config` via `#[from]`
//!
//! - `Identity`: the caller's account could not be resolved
//!   - Fatal, nothing is processed without an account ID
//!
//! - `Aws`: any failed control-plane call, tagged with the resource kind and
//!   the operation that failed

use crate::provider::ResourceKind;
use thiserror::Error;

/// Main error type for resource-stopper
#[derive(Error, Debug)]
pub enum StopperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("AWS SDK error: {kind} - {operation} failed: {message}")]
    Aws {
        kind: ResourceKind,
        operation: &'static str,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported resource type: {0}")]
    UnsupportedKind(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StopperError>;

impl StopperError {
    /// Wrap a provider SDK error for `kind` and `operation`
    ///
    /// Used as `.map_err(StopperError::aws(kind, "DescribeInstances"))`.
    pub fn aws<E: std::fmt::Display>(
        kind: ResourceKind,
        operation: &'static str,
    ) -> impl FnOnce(E) -> StopperError {
        move |e| StopperError::Aws {
            kind,
            operation,
            message: e.to_string(),
        }
    }
}
