//! REST API module for the Padel Friends group service.
//!
//! This module provides the `GroupGateway` seam used by the session layer
//! and `ApiClient`, its HTTP implementation.
//!
//! Group data endpoints are authorized by the group password, sent in the
//! `X-Group-Password` header on every request.

pub mod client;
pub mod error;
pub mod gateway;

pub use client::ApiClient;
pub use error::ApiError;
pub use gateway::GroupGateway;
