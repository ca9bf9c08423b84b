//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// A missing key is not an error: lookups report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Caller passed an argument the cache cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cache was constructed outside of a Tokio runtime
    #[error("No Tokio runtime available to drive expiration timers")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
