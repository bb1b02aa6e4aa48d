//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the taxonomy model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid dimension name: '{0}' (allowed: letters, digits, '-', '_')")]
    InvalidDimensionName(String),

    #[error("unknown item '{id}' in dimension '{dimension}'")]
    UnknownItem { dimension: String, id: String },

    #[error("unknown cube dimension: {0}")]
    UnknownCubeDimension(String),

    #[error("invalid depth filter: '{0}' (expected 'all' or a depth number)")]
    InvalidDepthFilter(String),

    #[error("invalid selection '{0}' (expected key=id)")]
    InvalidSelection(String),

    #[error("unknown tree key: {0}")]
    UnknownTreeKey(String),

    #[error("cube template references unknown placeholder: {{{0}}}")]
    UnknownPlaceholder(String),
}
