//! Application-level errors (wraps domain errors)

use std::sync::Arc;

use thiserror::Error;

use crate::domain::DomainError;

/// Why a dimension could not be loaded.
///
/// Cloneable because one failure may be handed to every caller that was
/// waiting on the same load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    #[error("not found: {location}")]
    NotFound { location: String },

    #[error("fetch failed for {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("timed out fetching {location}")]
    Timeout { location: String },

    #[error("malformed JSON in {location}: {message}")]
    Parse { location: String, message: String },
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("failed to load dimension '{dimension}': {reason}")]
    LoadFailed {
        dimension: String,
        #[source]
        reason: Arc<LoadFailure>,
    },

    #[error("no dimension loaded")]
    NothingLoaded,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
