//! Core library for Padel Friends.
//!
//! Keeps a device's group memberships alive across restarts: passwords are
//! saved per group, the active group session is restored on demand, and
//! group routes are only entered once restoration succeeds.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, GroupGateway};
pub use auth::{CredentialStore, SavedCredential};
pub use config::{Config, RestorePolicy};
pub use session::{
    Navigation, RestorationGuard, Route, SessionContext, SessionOptions, SessionState,
};
