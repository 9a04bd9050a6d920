//! Error Module - memsize Error Types
//!
//! # Error Categories
//!
//! ## Configuration Errors
//! - `Config` - Invalid estimator configuration
//! - `UnknownScalar` - Scalar name the size model does not know
//!
//! ## Usage Errors
//! - `Reentrant` - Nested estimate on an instance that is already walking
//!
//! Per-node problems (inaccessible fields, skipped nodes) are not errors:
//! the walker recovers from them and records them in its statistics.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for all memsize operations
///
/// # Examples
///
/// ```rust
/// use memsize::MemsizeError;
///
/// fn describe(err: &MemsizeError) -> String {
///     match err {
///         MemsizeError::UnknownScalar { name } => format!("no width for {}", name),
///         MemsizeError::Reentrant => "counter already walking".to_string(),
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum MemsizeError {
    /// Scalar name not present in the size model
    ///
    /// **When returned:** `SizeModel::width_of` or a `scalar_widths` config
    /// override names a type that is not a scalar kind
    ///
    /// **Recovery strategy:** Fix the caller; silently guessing a width would
    /// skew every estimate that uses it
    #[error("Unknown scalar type: {name}")]
    UnknownScalar { name: String },

    /// Configuration error
    ///
    /// **When returned:** `EstimatorConfig::validate` rejected the settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Nested call on a busy counter
    ///
    /// **When returned:** A `Reflect` implementation (or anything else running
    /// inside a walk) called back into the same `MemoryCounter`
    ///
    /// **Recovery strategy:** Use a separate counter for the nested measurement
    #[error("MemoryCounter is already walking a graph on this thread")]
    Reentrant,
}

impl MemsizeError {
    /// Check if this error indicates a bug in the calling code
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            MemsizeError::Reentrant | MemsizeError::UnknownScalar { .. }
        )
    }
}

/// Result type alias for memsize operations
pub type Result<T> = std::result::Result<T, MemsizeError>;
