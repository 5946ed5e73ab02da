//! Feed fan-out writer
//!
//! Two producers feed the same inbox abstraction:
//! - publish-triggered eager fan-out to followers (`source = follow`)
//! - trending-triggered discovery injection into non-followers' inboxes
//!   (`source = trending`), rate-capped per user
//!
//! Fan-out is best-effort per recipient: a single failed insert is logged
//! and skipped, and the remaining recipients still get the item. A
//! follower may see a new post after a short delay; that eventual
//! consistency is acceptable.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::FollowGraph;
use crate::db::feed_repo;
use crate::error::Result;
use crate::models::FeedSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct FanoutSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Whether another trending injection fits under the per-user rate cap
pub fn injection_allowed(recent_injections: i64, cap: i64) -> bool {
    recent_injections < cap
}

/// Push a newly published post into every follower's inbox
pub async fn on_post_published(
    pool: &PgPool,
    post_id: Uuid,
    follower_ids: &[Uuid],
    retention: i64,
    now: DateTime<Utc>,
) -> FanoutSummary {
    let mut summary = FanoutSummary::default();

    for follower in follower_ids {
        let delivered = async {
            feed_repo::upsert_item(pool, *follower, post_id, FeedSource::Follow, now).await?;
            feed_repo::prune_inbox(pool, *follower, retention).await?;
            Result::Ok(())
        }
        .await;

        match delivered {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                warn!(post_id = %post_id, follower = %follower, error = %e,
                      "fan-out insert failed, skipping follower");
                summary.failed += 1;
            }
        }
    }

    info!(
        post_id = %post_id,
        delivered = summary.delivered,
        failed = summary.failed,
        "publish fan-out finished"
    );

    summary
}

#[derive(Debug, Clone, Copy)]
pub struct InjectionConfig {
    /// Max trending items injected per user per 24h
    pub rate_cap: i64,
    /// How many recently-active inboxes to consider
    pub audience_limit: i64,
    pub retention: i64,
}

/// Inject a newly trending post into inboxes of recently-active users who
/// do not follow its author.
pub async fn on_post_trending(
    pool: &PgPool,
    graph: &dyn FollowGraph,
    post_id: Uuid,
    author_id: Uuid,
    config: InjectionConfig,
    now: DateTime<Utc>,
) -> Result<FanoutSummary> {
    // Without the follower set we cannot tell followers from non-followers;
    // surface the transient error and let the next cycle retry.
    let followers: HashSet<Uuid> = graph.followers_of(author_id).await?.into_iter().collect();

    let since = now - Duration::hours(24);
    let audience = feed_repo::recent_feed_user_ids(pool, since, config.audience_limit).await?;

    let mut summary = FanoutSummary::default();

    for user_id in audience {
        if user_id == author_id || followers.contains(&user_id) {
            continue;
        }

        let injected = async {
            let recent = feed_repo::trending_injections_since(pool, user_id, since).await?;
            if !injection_allowed(recent, config.rate_cap) {
                return Result::Ok(false);
            }

            feed_repo::upsert_item(pool, user_id, post_id, FeedSource::Trending, now).await?;
            feed_repo::prune_inbox(pool, user_id, config.retention).await?;
            Ok(true)
        }
        .await;

        match injected {
            Ok(true) => summary.delivered += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(post_id = %post_id, user_id = %user_id, error = %e,
                      "trending injection failed, skipping user");
                summary.failed += 1;
            }
        }
    }

    info!(
        post_id = %post_id,
        injected = summary.delivered,
        failed = summary.failed,
        "trending discovery injection finished"
    );

    Ok(summary)
}
