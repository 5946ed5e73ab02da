//! Redis plumbing: trending list cache and the cycle lease
//!
//! Both are optional at runtime. Without Redis the service degrades to
//! uncached trending reads and a process-local cycle lease, which is
//! correct for single-instance deployments.
//!
//! Keys:
//! - trending:list:{limit} → serialized trending response, short TTL
//! - trending:cycle:lease  → instance id of the current cycle holder

use redis::aio::ConnectionManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Trending list cache TTL (seconds)
const TRENDING_CACHE_TTL: u64 = 300;

const LEASE_KEY: &str = "trending:cycle:lease";

/// Interpret the SET NX reply. An error means the lease state is unknown,
/// so the cycle is skipped rather than risking two uncoordinated runs.
fn lease_reply(reply: redis::RedisResult<Option<String>>) -> bool {
    match reply {
        Ok(Some(_)) => true,
        Ok(None) => false,
        Err(e) => {
            warn!("lease acquisition failed, skipping cycle: {e}");
            false
        }
    }
}

#[derive(Clone)]
pub struct TrendingCache {
    client: Option<Arc<ConnectionManager>>,
    /// Fallback lease when Redis is not configured
    local_lease: Arc<AtomicBool>,
    instance_id: String,
}

impl TrendingCache {
    /// Connect to Redis; `None` url disables caching and distributed leasing
    pub async fn connect(redis_url: Option<&str>) -> Result<Self> {
        let client = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)
                    .map_err(|e| AppError::Cache(format!("redis client: {e}")))?;
                let manager = ConnectionManager::new(client)
                    .await
                    .map_err(|e| AppError::Cache(format!("redis connection: {e}")))?;
                Some(Arc::new(manager))
            }
            None => None,
        };

        Ok(Self {
            client,
            local_lease: Arc::new(AtomicBool::new(false)),
            instance_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn disabled() -> Self {
        Self {
            client: None,
            local_lease: Arc::new(AtomicBool::new(false)),
            instance_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Cached trending response, if present. Cache errors degrade to a miss.
    pub async fn get_trending(&self, limit: i64) -> Option<String> {
        let client = self.client.as_ref()?;
        let key = format!("trending:list:{limit}");

        match redis::cmd("GET")
            .arg(&key)
            .query_async::<_, Option<String>>(&mut client.as_ref().clone())
            .await
        {
            Ok(Some(json)) => {
                debug!("trending cache hit: {key}");
                Some(json)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("redis GET failed for {key}: {e}");
                None
            }
        }
    }

    pub async fn set_trending(&self, limit: i64, json: &str) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        let key = format!("trending:list:{limit}");

        if let Err(e) = redis::cmd("SETEX")
            .arg(&key)
            .arg(TRENDING_CACHE_TTL)
            .arg(json)
            .query_async::<_, ()>(&mut client.as_ref().clone())
            .await
        {
            warn!("redis SETEX failed for {key}: {e}");
        }
    }

    /// Drop cached trending lists after a selector run changes the set
    pub async fn invalidate_trending(&self) {
        let Some(client) = self.client.as_ref() else {
            return;
        };

        let mut cursor: u64 = 0;
        loop {
            let scan: std::result::Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg("trending:list:*")
                .arg("COUNT")
                .arg(100)
                .query_async(&mut client.as_ref().clone())
                .await;

            let (next, keys) = match scan {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("redis SCAN failed: {e}");
                    return;
                }
            };

            if !keys.is_empty() {
                if let Err(e) = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<_, ()>(&mut client.as_ref().clone())
                    .await
                {
                    warn!("redis DEL failed: {e}");
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }
    }

    /// Try to take the single-flight cycle lease. Returns false when another
    /// instance holds it or the lease state is unknowable; the caller skips
    /// this cycle and the next interval retries.
    pub async fn acquire_lease(&self, ttl_secs: u64) -> bool {
        match self.client.as_ref() {
            Some(client) => {
                let acquired: redis::RedisResult<Option<String>> = redis::cmd("SET")
                    .arg(LEASE_KEY)
                    .arg(&self.instance_id)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_secs)
                    .query_async(&mut client.as_ref().clone())
                    .await;

                lease_reply(acquired)
            }
            None => self
                .local_lease
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
        }
    }

    /// Release the lease if we still hold it. The TTL covers crashes.
    pub async fn release_lease(&self) {
        match self.client.as_ref() {
            Some(client) => {
                let holder: std::result::Result<Option<String>, _> = redis::cmd("GET")
                    .arg(LEASE_KEY)
                    .query_async(&mut client.as_ref().clone())
                    .await;

                if let Ok(Some(holder)) = holder {
                    if holder == self.instance_id {
                        let _: std::result::Result<(), _> = redis::cmd("DEL")
                            .arg(LEASE_KEY)
                            .query_async(&mut client.as_ref().clone())
                            .await;
                    }
                }
            }
            None => {
                self.local_lease.store(false, Ordering::Release);
            }
        }
    }
}
