/// Feed inbox repository
///
/// Feed items are addressable by (user_id, post_id) so fan-out upserts are
/// idempotent: re-delivering a post to the same inbox is a no-op.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{FeedItem, FeedSource};

/// Idempotent insert of one feed item. The original insertion time and
/// source win on conflict, so replays do not reorder a user's feed.
pub async fn upsert_item(
    pool: &PgPool,
    user_id: Uuid,
    post_id: Uuid,
    source: FeedSource,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO feed_items (user_id, post_id, source, inserted_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, post_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(post_id)
    .bind(source.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Drop the oldest items beyond the retention cap for one inbox
pub async fn prune_inbox(pool: &PgPool, user_id: Uuid, retain: i64) -> Result<u64> {
    let pruned = sqlx::query(
        "DELETE FROM feed_items \
         WHERE user_id = $1 AND post_id IN ( \
             SELECT post_id FROM feed_items \
             WHERE user_id = $1 \
             ORDER BY inserted_at DESC \
             OFFSET $2 \
         )",
    )
    .bind(user_id)
    .bind(retain)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(pruned)
}

/// Pre-filter item count for pagination totals
pub async fn count_items(pool: &PgPool, user_id: Uuid, source: Option<FeedSource>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM feed_items \
         WHERE user_id = $1 AND ($2::VARCHAR IS NULL OR source = $2)",
    )
    .bind(user_id)
    .bind(source.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// One page of a user's inbox, newest first
pub async fn page_items(
    pool: &PgPool,
    user_id: Uuid,
    source: Option<FeedSource>,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedItem>> {
    let items = sqlx::query_as::<_, FeedItem>(
        "SELECT user_id, post_id, inserted_at, source \
         FROM feed_items \
         WHERE user_id = $1 AND ($2::VARCHAR IS NULL OR source = $2) \
         ORDER BY inserted_at DESC, post_id DESC \
         LIMIT $3 OFFSET $4",
    )
    .bind(user_id)
    .bind(source.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// How many trending items were injected into an inbox since `since`,
/// used to enforce the per-user injection rate cap.
pub async fn trending_injections_since(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM feed_items \
         WHERE user_id = $1 AND source = 'trending' AND inserted_at >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Users with recent inbox activity, the audience for trending discovery
pub async fn recent_feed_user_ids(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT DISTINCT user_id FROM feed_items WHERE inserted_at >= $1 LIMIT $2",
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
