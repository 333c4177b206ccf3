//! Error types for the enrichment service.

use std::time::Duration;

use crate::registry::RegistryError;

/// Errors raised around the enrichment passes.
///
/// The passes themselves never fail; these cover configuration, the
/// registry lookup and request decoding.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The registry lookup failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The registry did not answer in time.
    #[error("registry lookup timed out after {duration:?}")]
    RegistryTimeout {
        /// The duration after which the lookup was abandoned.
        duration: Duration,
    },

    /// A single request references more attribute names than allowed.
    #[error("too many fields: {count} names exceeds limit of {limit}")]
    TooManyFields {
        /// Number of distinct names in the request.
        count: usize,
        /// Maximum allowed names.
        limit: usize,
    },

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
