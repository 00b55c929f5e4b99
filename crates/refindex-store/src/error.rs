use refindex_common::ReferenceError;
use thiserror::Error;

/// Failures raised by the stores. None of them leave a store partially
/// updated: every check runs before the first index is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A required argument was rejected, e.g. an edge whose target is the
    /// cell it references.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Identifier text that did not parse, or a label mapped onto itself.
    #[error("invalid argument: {0}")]
    Reference(#[from] ReferenceError),

    /// Fail-fast lookup of something that is not stored.
    #[error("{0} not found")]
    NotFound(String),

    /// Scalar record-store operation on a multi-value store.
    #[error("{operation} is not supported by {store}, use {instead}")]
    Unsupported {
        store: &'static str,
        operation: &'static str,
        instead: &'static str,
    },

    /// A label chain longer than `IndexConfig::max_label_chain`.
    #[error("label chain starting at {label} exceeds {limit} links")]
    LabelChainTooDeep { label: String, limit: usize },
}

impl IndexError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::Reference(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
