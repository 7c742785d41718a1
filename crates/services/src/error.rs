//! Shared error types for the services crate.

use thiserror::Error;

use round_core::model::{QuestionError, TreeError};
use storage::repository::StorageError;

/// Failures talking to the remote player registry.
///
/// Every variant means the registry is unavailable for this call; callers
/// downgrade these to local outcomes instead of propagating them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("player registry is not configured")]
    Disabled,
    #[error("player registry request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("player registry unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted while drawing a question sequence.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question pool has {available} questions, a round needs {needed}")]
    InsufficientPool { needed: usize, available: usize },
    #[error("question {index} in the pool is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors emitted by the round engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("option index {0} is out of range")]
    InvalidOption(usize),
    #[error(transparent)]
    PathIntegrity(#[from] TreeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Questions(#[from] QuestionSourceError),
}
