use async_trait::async_trait;

use crate::models::{Group, MatchPage, Player, Statistic};

use super::ApiError;

/// Network boundary for group lookup, password verification and
/// authenticated data fetches.
///
/// `SessionContext` only talks to the server through this trait, so tests and
/// alternative transports can stand in for [`ApiClient`](super::ApiClient).
#[async_trait]
pub trait GroupGateway: Send + Sync {
    /// Resolve a group by its display name. Unknown names yield `ApiError::NotFound`.
    async fn get_by_name(&self, name: &str) -> Result<Group, ApiError>;

    /// Check a password against a group. A rejected password is `Ok(false)`.
    async fn authenticate(&self, group_id: &str, password: &str) -> Result<bool, ApiError>;

    async fn get_players(&self, group_id: &str, password: &str) -> Result<Vec<Player>, ApiError>;

    async fn get_matches(
        &self,
        group_id: &str,
        password: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MatchPage, ApiError>;

    async fn get_statistics(
        &self,
        group_id: &str,
        password: &str,
    ) -> Result<Vec<Statistic>, ApiError>;
}
