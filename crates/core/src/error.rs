//! Error types for the ContentPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Introspection and recovery never fail: they log and degrade. Only the LLM
//! call and the transactional write path surface errors to callers.

use crate::content::ObjectId;
use thiserror::Error;

/// The top-level error type for all ContentPilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Content store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Population errors ---
    #[error("Population error: {0}")]
    Populate(#[from] PopulateError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Object not found: #{0}")]
    NotFound(ObjectId),

    #[error("Unknown content type: {0}")]
    UnknownType(String),

    #[error("Content type cannot be instantiated: {0}")]
    NotInstantiable(String),

    #[error("Persist failed for #{object}: {reason}")]
    PersistFailed { object: ObjectId, reason: String },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum PopulateError {
    /// The whole population was rolled back; `source` is the failure that caused it.
    #[error("Population of #{object} rolled back: {source}")]
    RolledBack {
        object: ObjectId,
        #[source]
        source: StoreError,
    },

    #[error("Transaction could not be opened or closed: {0}")]
    Store(#[from] StoreError),
}
