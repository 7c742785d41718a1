use async_trait::async_trait;
use round_core::model::SessionDraft;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::progress;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable progress for the player's round.
///
/// Only the progression engine writes through this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read whatever was persisted. A never-written store yields an empty draft.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a stored value is malformed.
    async fn load(&self) -> Result<SessionDraft, StorageError>;

    /// Write every field present in `draft`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn save(&self, draft: &SessionDraft) -> Result<(), StorageError>;

    /// Forget the stored session (the "new game" action).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory store for tests and throwaway rounds.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for `key`, as a backend would hold it.
    #[must_use]
    pub fn raw(&self, key: progress::ProgressKey) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|guard| guard.get(key.as_str()).cloned())
    }

    /// True when nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|guard| guard.is_empty()).unwrap_or(true)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<SessionDraft, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        progress::decode(&guard)
    }

    async fn save(&self, draft: &SessionDraft) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for (key, value) in progress::encode(draft) {
            guard.insert(key.as_str().to_owned(), value);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// Storage handles behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
        }
    }
}
