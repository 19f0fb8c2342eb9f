//! External read-only capabilities consumed by the core.
//!
//! Word approval and publisher identity are boundary checks the core does
//! not own: the session manager and the HTTP auth layer depend only on the
//! traits here. Storage-backed reference implementations are provided for
//! the server binary and for tests.

use crate::errors::{StorageError, WordmintError, WordmintResult};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Word approval lookup: `exists(word, publisher) && status == approved`.
#[async_trait]
pub trait WordDirectory: Send + Sync {
    async fn word_is_approved_for(
        &self,
        word_id: Uuid,
        publisher_id: Uuid,
    ) -> WordmintResult<bool>;
}

/// Publisher identity and status resolution.
#[async_trait]
pub trait PublisherDirectory: Send + Sync {
    async fn publisher_is_active(&self, publisher_id: Uuid) -> WordmintResult<bool>;

    async fn resolve_api_key(&self, api_key: &str) -> WordmintResult<Option<PublisherRecord>>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WordStatus {
    Pending,
    Approved { approved_at: DateTime<Utc> },
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WordRecord {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub word: String,
    #[serde(flatten)]
    pub status: WordStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherStatus {
    Active,
    Suspended,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PublisherRecord {
    pub id: Uuid,
    pub company_name: String,
    pub api_key: String,
    pub status: PublisherStatus,
    pub created_at: DateTime<Utc>,
}

fn word_key(publisher_id: Uuid, word_id: Uuid) -> Vec<u8> {
    format!("word:{}:{}", publisher_id, word_id).into_bytes()
}

fn publisher_key(publisher_id: Uuid) -> Vec<u8> {
    format!("publisher:{}", publisher_id).into_bytes()
}

fn api_key_index_key(api_key: &str) -> Vec<u8> {
    format!("publisher:apikey:{}", api_key).into_bytes()
}

/// RocksDB-backed word directory.
#[derive(Clone)]
pub struct StoredWords {
    storage: Arc<Storage>,
}

impl StoredWords {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Upsert a word record. Curation flows live outside this backend;
    /// this exists for seeding and tests.
    pub fn put(&self, record: &WordRecord) -> WordmintResult<()> {
        let bytes = serde_json::to_vec(record).map_err(|e| {
            WordmintError::Storage(StorageError::WriteFailed(format!(
                "Failed to encode word {}: {}",
                record.id, e
            )))
        })?;
        self.storage.put(&word_key(record.publisher_id, record.id), &bytes)
    }

    pub fn get(&self, publisher_id: Uuid, word_id: Uuid) -> WordmintResult<Option<WordRecord>> {
        let Some(bytes) = self.storage.get(&word_key(publisher_id, word_id)) else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            WordmintError::Storage(StorageError::CorruptedData(format!(
                "Failed to decode word {}: {}",
                word_id, e
            )))
        })?;
        Ok(Some(record))
    }
}

#[async_trait]
impl WordDirectory for StoredWords {
    async fn word_is_approved_for(
        &self,
        word_id: Uuid,
        publisher_id: Uuid,
    ) -> WordmintResult<bool> {
        Ok(self
            .get(publisher_id, word_id)?
            .map(|record| matches!(record.status, WordStatus::Approved { .. }))
            .unwrap_or(false))
    }
}

/// RocksDB-backed publisher directory.
#[derive(Clone)]
pub struct StoredPublishers {
    storage: Arc<Storage>,
}

impl StoredPublishers {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn put(&self, record: &PublisherRecord) -> WordmintResult<()> {
        let bytes = serde_json::to_vec(record).map_err(|e| {
            WordmintError::Storage(StorageError::WriteFailed(format!(
                "Failed to encode publisher {}: {}",
                record.id, e
            )))
        })?;
        self.storage.batch_write(&[
            (publisher_key(record.id), bytes),
            (
                api_key_index_key(&record.api_key),
                record.id.to_string().into_bytes(),
            ),
        ])
    }

    pub fn get(&self, publisher_id: Uuid) -> WordmintResult<Option<PublisherRecord>> {
        let Some(bytes) = self.storage.get(&publisher_key(publisher_id)) else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            WordmintError::Storage(StorageError::CorruptedData(format!(
                "Failed to decode publisher {}: {}",
                publisher_id, e
            )))
        })?;
        Ok(Some(record))
    }
}

#[async_trait]
impl PublisherDirectory for StoredPublishers {
    async fn publisher_is_active(&self, publisher_id: Uuid) -> WordmintResult<bool> {
        Ok(self
            .get(publisher_id)?
            .map(|record| record.status == PublisherStatus::Active)
            .unwrap_or(false))
    }

    async fn resolve_api_key(&self, api_key: &str) -> WordmintResult<Option<PublisherRecord>> {
        let Some(id_bytes) = self.storage.get(&api_key_index_key(api_key)) else {
            return Ok(None);
        };
        let publisher_id = String::from_utf8(id_bytes)
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok())
            .ok_or_else(|| {
                WordmintError::Storage(StorageError::CorruptedData(
                    "Invalid publisher id in API key index".to_string(),
                ))
            })?;
        self.get(publisher_id)
    }
}
