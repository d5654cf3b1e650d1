//! Relationship records (CRM contacts).

use crate::errors::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Keeps contact records up to date.
#[async_trait]
pub trait RelationshipRecordService: Send + Sync {
    /// Creates the contact or updates the existing one with the same email.
    async fn upsert_contact(
        &self,
        email: &str,
        name: &str,
        notes: Option<&str>,
    ) -> Result<(), CollaboratorError>;
}

/// A stored contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Contact email, the record key.
    pub email: String,
    /// Contact name.
    pub name: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Last time the record changed.
    pub updated_at: DateTime<Utc>,
}

fn upsert(
    contacts: &mut BTreeMap<String, ContactRecord>,
    email: &str,
    name: &str,
    notes: Option<&str>,
) {
    let now = Utc::now();
    contacts
        .entry(email.to_string())
        .and_modify(|record| {
            record.name = name.to_string();
            if let Some(notes) = notes {
                record.notes = Some(notes.to_string());
            }
            record.updated_at = now;
        })
        .or_insert_with(|| ContactRecord {
            email: email.to_string(),
            name: name.to_string(),
            notes: notes.map(str::to_string),
            updated_at: now,
        });
}

/// An in-memory record service used in tests and demos.
#[derive(Debug, Default)]
pub struct MockRelationshipRecordService {
    contacts: Mutex<BTreeMap<String, ContactRecord>>,
}

impl MockRelationshipRecordService {
    /// Creates an empty record service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `email`, if any.
    #[must_use]
    pub fn get(&self, email: &str) -> Option<ContactRecord> {
        self.contacts.lock().get(email).cloned()
    }

    /// Returns all records ordered by email.
    #[must_use]
    pub fn contacts(&self) -> Vec<ContactRecord> {
        self.contacts.lock().values().cloned().collect()
    }
}

#[async_trait]
impl RelationshipRecordService for MockRelationshipRecordService {
    async fn upsert_contact(
        &self,
        email: &str,
        name: &str,
        notes: Option<&str>,
    ) -> Result<(), CollaboratorError> {
        upsert(&mut self.contacts.lock(), email, name, notes);
        Ok(())
    }
}

/// Stores contacts in a JSON file keyed by email.
#[derive(Debug)]
pub struct JsonFileRecordService {
    path: PathBuf,
    file_lock: tokio::sync::Mutex<()>,
}

impl JsonFileRecordService {
    /// Creates a record service backed by `path`; the file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all stored contacts.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Record` if the file exists but is unreadable.
    pub async fn load(&self) -> Result<BTreeMap<String, ContactRecord>, CollaboratorError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CollaboratorError::record("*", format!("corrupt record file: {e}"))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CollaboratorError::record("*", format!("read failed: {e}"))),
        }
    }
}

#[async_trait]
impl RelationshipRecordService for JsonFileRecordService {
    async fn upsert_contact(
        &self,
        email: &str,
        name: &str,
        notes: Option<&str>,
    ) -> Result<(), CollaboratorError> {
        let _guard = self.file_lock.lock().await;

        let mut contacts = self.load().await?;
        upsert(&mut contacts, email, name, notes);

        let json = serde_json::to_string_pretty(&contacts)
            .map_err(|e| CollaboratorError::record(email, e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| CollaboratorError::record(email, format!("write failed: {e}")))?;

        tracing::debug!(email = %email, path = %self.path.display(), "contact upserted");
        Ok(())
    }
}
