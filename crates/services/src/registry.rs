use std::env;

use async_trait::async_trait;
use reqwest::Client;

use round_core::model::{NewPlayerRecord, PlayerRecordId, RemotePlayerRecord};

use crate::error::RegistryError;

/// Remote collection of players, exposed as `/api/player/`.
///
/// There is no update operation: replacing a record is delete then create.
#[async_trait]
pub trait PlayerRegistry: Send + Sync {
    /// `GET /api/player/`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the registry cannot be reached or answers with an error.
    async fn list_players(&self) -> Result<Vec<RemotePlayerRecord>, RegistryError>;

    /// `POST /api/player/`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the registry cannot be reached or rejects the record.
    async fn create_player(&self, record: &NewPlayerRecord) -> Result<(), RegistryError>;

    /// `DELETE /api/player/{id}/`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the registry cannot be reached or refuses the delete.
    async fn delete_player(&self, id: PlayerRecordId) -> Result<(), RegistryError>;
}

#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub base_url: String,
}

impl RegistryConfig {
    /// Reads `ROUND_BACKEND_URL`. Returns `None` when unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("ROUND_BACKEND_URL").ok()?;
        Self::new(base_url)
    }

    /// Returns `None` for a blank URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Option<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self { base_url })
    }

    fn collection_url(&self) -> String {
        format!("{}/api/player/", self.base_url.trim_end_matches('/'))
    }

    fn record_url(&self, id: PlayerRecordId) -> String {
        format!("{}{id}/", self.collection_url())
    }
}

/// `PlayerRegistry` over HTTP. Without a config every call fails with
/// `RegistryError::Disabled`.
#[derive(Clone)]
pub struct HttpPlayerRegistry {
    client: Client,
    config: Option<RegistryConfig>,
}

impl HttpPlayerRegistry {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RegistryConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<RegistryConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&RegistryConfig, RegistryError> {
        self.config.as_ref().ok_or(RegistryError::Disabled)
    }
}

#[async_trait]
impl PlayerRegistry for HttpPlayerRegistry {
    async fn list_players(&self) -> Result<Vec<RemotePlayerRecord>, RegistryError> {
        let url = self.config()?.collection_url();
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn create_player(&self, record: &NewPlayerRecord) -> Result<(), RegistryError> {
        let url = self.config()?.collection_url();
        let response = self.client.post(url).json(record).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::HttpStatus(response.status()));
        }
        Ok(())
    }

    async fn delete_player(&self, id: PlayerRecordId) -> Result<(), RegistryError> {
        let url = self.config()?.record_url(id);
        let response = self.client.delete(url).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::HttpStatus(response.status()));
        }
        Ok(())
    }
}
