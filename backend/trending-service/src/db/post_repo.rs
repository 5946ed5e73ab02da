/// Post repository
///
/// Lookups and trending-field persistence for posts. The non-engagement
/// fields are owned by the content subsystem; this service only writes
/// `trending_score`, `trending_status`, `trending_rank`, `trending_since`
/// and `follower_count_at_scoring`.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Post;

const POST_COLUMNS: &str = "id, author_id, created_at, published, follower_count_at_scoring, \
     views_count, likes_count, comments_count, saves_count, shares_count, \
     trending_score, trending_status, trending_rank, trending_since, flagged_count";

pub async fn find_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

/// Batch-resolve published posts; missing or unpublished ids are absent
/// from the result (tombstone filtering is the caller's concern).
pub async fn find_published_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1) AND published"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// Published posts created within the scoring lookback window
pub async fn scoring_candidates(pool: &PgPool, created_after: DateTime<Utc>) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE published AND created_at >= $1 \
         ORDER BY created_at DESC"
    ))
    .bind(created_after)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// Persist a freshly computed score. Status and rank are untouched here;
/// they belong to the selector pass.
pub async fn update_trending_score(
    pool: &PgPool,
    post_id: Uuid,
    score: f64,
    follower_count: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET trending_score = $1, follower_count_at_scoring = $2 WHERE id = $3",
    )
    .bind(score)
    .bind(follower_count)
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Subset of `ids` whose trending_status is currently false
pub async fn not_yet_trending(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>> {
    let out = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM posts WHERE id = ANY($1) AND NOT trending_status",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(out)
}

/// Mark a post trending with its 1-based rank. `trending_since` is set only
/// on the false→true transition and preserved otherwise.
pub async fn promote(pool: &PgPool, post_id: Uuid, rank: i32, now: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "UPDATE posts \
         SET trending_status = TRUE, trending_rank = $1, \
             trending_since = COALESCE(trending_since, $2) \
         WHERE id = $3",
    )
    .bind(rank)
    .bind(now)
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clear trending state from every post not in the selected set
pub async fn demote_except(pool: &PgPool, keep: &[Uuid]) -> Result<u64> {
    let demoted = sqlx::query(
        "UPDATE posts \
         SET trending_status = FALSE, trending_rank = NULL, trending_since = NULL \
         WHERE trending_status AND NOT (id = ANY($1))",
    )
    .bind(keep)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(demoted)
}

/// Current trending set in rank order
pub async fn trending_list(pool: &PgPool, limit: i64) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE trending_status \
         ORDER BY trending_rank ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// Count of posts published within the window (analytics denominator)
pub async fn published_count_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts WHERE published AND created_at >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
