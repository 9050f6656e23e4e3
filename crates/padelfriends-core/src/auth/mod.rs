//! Credential persistence for group passwords.
//!
//! This module provides:
//! - `CredentialStore`: Ordered registry of saved group passwords
//! - `KeyValueStore`: The blob storage it flushes to, with file, OS keychain
//!   and in-memory backends
//!
//! The registry is stored as a single JSON array under `SAVED_GROUPS_KEY`.

pub mod credentials;
pub mod storage;

pub use credentials::{CredentialStore, SavedCredential, SAVED_GROUPS_KEY};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
