use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid document path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid revision {revision:?}: {reason}")]
    InvalidRevision { revision: String, reason: String },
}

pub type TypeResult<T> = Result<T, TypeError>;
