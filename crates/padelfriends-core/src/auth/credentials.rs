use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::KeyValueStore;

/// Storage key holding the JSON array of saved groups
pub const SAVED_GROUPS_KEY: &str = "padelfriends-saved-groups";

/// A group password remembered on this device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SavedCredential {
    pub id: String,
    pub name: String,
    pub password: String,
    #[serde(rename = "lastAccessedAt")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub last_accessed_at: DateTime<Utc>,
}

impl fmt::Debug for SavedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("last_accessed_at", &self.last_accessed_at)
            .finish()
    }
}

/// Ordered registry of per-group passwords, most recently accessed first.
///
/// Every mutation is flushed to the backing store before returning. A missing
/// or unreadable blob starts the registry empty; the next successful write
/// replaces it.
pub struct CredentialStore {
    backend: Box<dyn KeyValueStore>,
    entries: Vec<SavedCredential>,
}

impl CredentialStore {
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let entries = match Self::read(&*backend) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Saved groups unreadable, starting empty");
                Vec::new()
            }
        };
        debug!(count = entries.len(), "Saved groups loaded");
        Self { backend, entries }
    }

    fn read(backend: &dyn KeyValueStore) -> Result<Vec<SavedCredential>> {
        let Some(contents) = backend.get(SAVED_GROUPS_KEY)? else {
            return Ok(Vec::new());
        };
        let parsed: Vec<SavedCredential> =
            serde_json::from_str(&contents).context("Failed to parse saved groups")?;
        Ok(Self::normalize(parsed))
    }

    /// One entry per id (first occurrence wins), newest access first.
    fn normalize(parsed: Vec<SavedCredential>) -> Vec<SavedCredential> {
        let mut entries: Vec<SavedCredential> = Vec::with_capacity(parsed.len());
        for entry in parsed {
            if !entries.iter().any(|e| e.id == entry.id) {
                entries.push(entry);
            }
        }
        // Stable, so entries sharing a timestamp keep their stored order.
        entries.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
        entries
    }

    fn flush(&mut self) -> Result<()> {
        let contents = serde_json::to_string(&self.entries)?;
        self.backend.set(SAVED_GROUPS_KEY, &contents)
    }

    /// Insert or refresh a credential and move it to the front.
    ///
    /// Any entry with the same id, or with the same name under an older id,
    /// is replaced. The in-memory registry is updated even if the flush fails.
    pub fn add(&mut self, id: &str, name: &str, password: &str) -> Result<()> {
        self.entries.retain(|e| e.id != id && e.name != name);
        self.entries.insert(
            0,
            SavedCredential {
                id: id.to_string(),
                name: name.to_string(),
                password: password.to_string(),
                last_accessed_at: Utc::now(),
            },
        );
        debug!(group_id = id, count = self.entries.len(), "Saved group credential");
        self.flush()
    }

    /// Forget the credential for `id`. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Ok(());
        }
        debug!(group_id = id, "Removed saved group credential");
        self.flush()
    }

    pub fn lookup(&self, id: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.password.clone())
    }

    pub fn list(&self) -> &[SavedCredential] {
        &self.entries
    }

    pub fn most_recent(&self) -> Option<&SavedCredential> {
        self.entries.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
