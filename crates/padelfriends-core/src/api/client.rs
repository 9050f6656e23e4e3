//! API client for communicating with the Padel Friends REST API.
//!
//! This module provides the `ApiClient` struct, the HTTP implementation of
//! [`GroupGateway`]. Requests are never retried here; callers decide.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Group, MatchPage, Player, Statistic};

use super::{ApiError, GroupGateway};

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the group password on authorized requests
const PASSWORD_HEADER: &str = "X-Group-Password";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "isAuthenticated", default)]
    is_authenticated: bool,
}

/// API client for the group service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:8080`)
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid API URL {}: {}", base_url, e))?;

        Ok(Self { client, base_url })
    }

    /// Build `{base}/api/group/{segments...}` with each segment percent-encoded.
    fn group_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidRequest(format!("API URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "group"])
            .extend(segments);
        Ok(url)
    }

    fn password_headers(password: &str) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let value = header::HeaderValue::from_str(password)
            .map_err(|_| {
                ApiError::InvalidRequest("password contains invalid header characters".to_string())
            })?;
        headers.insert(PASSWORD_HEADER, value);
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        password: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.get(url.clone());
        if let Some(password) = password {
            request = request.headers(Self::password_headers(password)?);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        debug!(path = url.path(), bytes = text.len(), "Response received");
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse response from {}: {}",
                url.path(),
                e
            ))
        })
    }
}

#[async_trait]
impl GroupGateway for ApiClient {
    async fn get_by_name(&self, name: &str) -> Result<Group, ApiError> {
        let url = self.group_url(&["byname", name])?;
        self.get(url, None).await
    }

    async fn authenticate(&self, group_id: &str, password: &str) -> Result<bool, ApiError> {
        let url = self.group_url(&[group_id, "authenticate"])?;

        let response = self
            .client
            .post(url)
            .json(&AuthRequest { password })
            .send()
            .await?;

        match Self::check_response(response).await {
            Ok(response) => {
                let auth: AuthResponse = response
                    .json()
                    .await
                    .map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse auth response: {}", e))
                    })?;
                Ok(auth.is_authenticated)
            }
            Err(ApiError::PasswordRejected) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_players(&self, group_id: &str, password: &str) -> Result<Vec<Player>, ApiError> {
        let url = self.group_url(&[group_id, "players"])?;
        self.get(url, Some(password)).await
    }

    async fn get_matches(
        &self,
        group_id: &str,
        password: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MatchPage, ApiError> {
        let mut url = self.group_url(&[group_id, "matches"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("pageSize", &page_size.to_string());
        self.get(url, Some(password)).await
    }

    async fn get_statistics(
        &self,
        group_id: &str,
        password: &str,
    ) -> Result<Vec<Statistic>, ApiError> {
        let url = self.group_url(&[group_id, "statistics"])?;
        self.get(url, Some(password)).await
    }
}
