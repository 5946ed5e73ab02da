/// Engagement repository
///
/// Counter increments and the hourly bucket ring backing decay scoring.
/// Increments are single-statement atomic upserts, so concurrent writers
/// never lose updates. Events themselves are not retained.
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EngagementBucket, EngagementKind};

/// Record one engagement event: bump the cumulative counter and, for
/// scored kinds, the hourly bucket for the event timestamp.
///
/// Duplicate submissions of the same logical event are not deduplicated
/// here; idempotency is a caller concern.
pub async fn record_event(
    pool: &PgPool,
    post_id: Uuid,
    kind: EngagementKind,
    weight: i64,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    // kind comes from a closed enum, so the column name is static
    let counter = kind.counter_column();
    sqlx::query(&format!(
        "UPDATE posts SET {counter} = {counter} + $1 WHERE id = $2"
    ))
    .bind(weight)
    .bind(post_id)
    .execute(&mut *tx)
    .await?;

    if let Some(bucket) = kind.bucket_column() {
        sqlx::query(&format!(
            "INSERT INTO post_engagement_buckets (post_id, bucket_hour, {bucket}) \
             VALUES ($1, date_trunc('hour', $2::timestamptz), $3) \
             ON CONFLICT (post_id, bucket_hour) \
             DO UPDATE SET {bucket} = post_engagement_buckets.{bucket} + EXCLUDED.{bucket}"
        ))
        .bind(post_id)
        .bind(timestamp)
        .bind(weight)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Live buckets for a post, oldest first
pub async fn buckets_for_post(
    pool: &PgPool,
    post_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<EngagementBucket>> {
    let buckets = sqlx::query_as::<_, EngagementBucket>(
        "SELECT bucket_hour, views, likes, comments, saves, shares \
         FROM post_engagement_buckets \
         WHERE post_id = $1 AND bucket_hour >= $2 \
         ORDER BY bucket_hour ASC",
    )
    .bind(post_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(buckets)
}

/// Drop bucket rows that fell out of the 24h ring. Run once per cycle to
/// bound storage per post regardless of event volume.
pub async fn delete_stale_buckets(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = now - Duration::hours(25);
    let deleted = sqlx::query("DELETE FROM post_engagement_buckets WHERE bucket_hour < $1")
        .bind(cutoff)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(deleted)
}
