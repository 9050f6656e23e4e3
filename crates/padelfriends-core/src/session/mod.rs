//! Session management for the active group.
//!
//! This module provides:
//! - `SessionContext`: The single source of truth for which group is active
//!   and with what authority, plus its cached players, matches and statistics
//! - `RestorationGuard`: Gatekeeper for group routes that restores a session
//!   from saved credentials after a restart or direct navigation

pub mod context;
pub mod guard;
pub mod state;

pub use context::{SessionContext, SessionOptions};
pub use guard::{GuardState, Navigation, RestorationGuard, Route};
pub use state::{Collection, LoadingFlags, PageInfo, SessionState};
