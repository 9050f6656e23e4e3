//! Data models for Padel Friends entities.
//!
//! This module contains the data structures returned by the group API:
//!
//! - `Group`: A named, password-protected space of players and matches
//! - `Player`, `Match`, `MatchPage`: Group members and their games
//! - `Statistic`: Per-player aggregates computed by the server

pub mod group;

pub use group::{Group, Match, MatchPage, MatchStatus, Player, Statistic};
