/// Follow-graph client
///
/// The follow graph lives in an external service; this core only reads it.
/// All lookups carry a timeout and a bounded retry count. Exhausting
/// retries surfaces `AppError::Transient`, which batch callers log and
/// skip without aborting the cycle.
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::error::{AppError, Result};

#[async_trait]
pub trait FollowGraph: Send + Sync {
    /// Followers of the given author
    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>>;

    /// Follower count, used for score normalization
    async fn follower_count(&self, user_id: Uuid) -> Result<i64>;
}

#[derive(Debug, Deserialize)]
struct FollowersResponse {
    followers: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct FollowerCountResponse {
    count: i64,
}

/// HTTP-backed follow graph client
pub struct HttpFollowGraph {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpFollowGraph {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    async fn get_with_retry<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut backoff = Duration::from_millis(200);
        let mut last_err = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.http.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<T>()
                        .await
                        .map_err(|e| AppError::Transient(format!("graph response decode: {e}")));
                }
                Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                    return Err(AppError::NotFound(format!("graph lookup: {url}")));
                }
                Ok(resp) => {
                    last_err = format!("graph returned {}", resp.status());
                    warn!(url, attempt, status = %resp.status(), "graph lookup failed");
                }
                Err(e) => {
                    last_err = e.to_string();
                    warn!(url, attempt, error = %e, "graph lookup failed");
                }
            }
        }

        Err(AppError::Transient(format!(
            "graph unavailable after {} attempts: {last_err}",
            self.max_retries + 1
        )))
    }
}

#[async_trait]
impl FollowGraph for HttpFollowGraph {
    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>> {
        let url = format!("{}/api/v1/users/{}/followers", self.base_url, author_id);
        let resp: FollowersResponse = self.get_with_retry(&url).await?;
        Ok(resp.followers)
    }

    async fn follower_count(&self, user_id: Uuid) -> Result<i64> {
        let url = format!("{}/api/v1/users/{}/follower-count", self.base_url, user_id);
        let resp: FollowerCountResponse = self.get_with_retry(&url).await?;
        Ok(resp.count)
    }
}

/// Fixed in-memory follow graph
///
/// Used when no graph service is configured and as a test double.
#[derive(Debug, Default, Clone)]
pub struct StaticFollowGraph {
    followers: HashMap<Uuid, Vec<Uuid>>,
}

impl StaticFollowGraph {
    pub fn new(followers: HashMap<Uuid, Vec<Uuid>>) -> Self {
        Self { followers }
    }
}

#[async_trait]
impl FollowGraph for StaticFollowGraph {
    async fn followers_of(&self, author_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.followers.get(&author_id).cloned().unwrap_or_default())
    }

    async fn follower_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.followers.get(&user_id).map(|f| f.len() as i64).unwrap_or(0))
    }
}
