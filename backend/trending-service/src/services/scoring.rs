//! Trending scorer
//!
//! Computes a decayed, weighted, follower-normalized score per post from
//! its hourly engagement buckets:
//!
//! - each bucket contributes `count * exp(-age_hours / decay_constant)`,
//!   with the bucket midpoint as the representative age
//! - `raw = Σ weight[m] * decayed_count[m]` over the five scored metrics
//! - `score = raw / (1 + follower_count)^follower_norm`, so high-follower
//!   accounts do not trend trivially
//!
//! The batch pass persists `trending_score` only; status and rank belong
//! to the selector. A failure on one post is logged and skipped, never
//! aborting the batch; the post is rescored on the next cycle.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::clients::FollowGraph;
use crate::db::{engagement_repo, post_repo};
use crate::error::Result;
use crate::models::{EngagementBucket, Post, TrendingSettings};

/// Buckets older than this never contribute to the score
const BUCKET_WINDOW_HOURS: i64 = 24;

/// Decayed per-metric counts over the live bucket window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayedCounts {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub saves: f64,
    pub shares: f64,
}

pub fn decayed_counts(
    buckets: &[EngagementBucket],
    decay_constant: f64,
    now: DateTime<Utc>,
) -> DecayedCounts {
    let mut out = DecayedCounts::default();

    for bucket in buckets {
        // Bucket midpoint represents all events recorded in that hour
        let midpoint = bucket.bucket_hour + Duration::minutes(30);
        let age_hours = (now - midpoint).num_minutes() as f64 / 60.0;

        if age_hours > BUCKET_WINDOW_HOURS as f64 {
            continue;
        }
        // Clock skew can place the midpoint slightly in the future
        let age_hours = age_hours.max(0.0);

        let factor = (-age_hours / decay_constant).exp();
        out.views += bucket.views as f64 * factor;
        out.likes += bucket.likes as f64 * factor;
        out.comments += bucket.comments as f64 * factor;
        out.saves += bucket.saves as f64 * factor;
        out.shares += bucket.shares as f64 * factor;
    }

    out
}

/// Pure scoring formula; the batch pass and tests share this path
pub fn compute_score(
    buckets: &[EngagementBucket],
    follower_count: i64,
    settings: &TrendingSettings,
    now: DateTime<Utc>,
) -> f64 {
    let d = decayed_counts(buckets, settings.decay_constant, now);
    let w = &settings.weights;

    let raw = w.views * d.views
        + w.likes * d.likes
        + w.comments * d.comments
        + w.saves * d.saves
        + w.shares * d.shares;

    let follower_norm = (1.0 + follower_count.max(0) as f64).powf(w.follower_norm);

    raw / follower_norm
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringSummary {
    pub scored: usize,
    pub skipped: usize,
}

/// Score every published post inside the lookback window
pub async fn run_scoring_pass(
    pool: &PgPool,
    graph: &dyn FollowGraph,
    settings: &TrendingSettings,
    lookback_days: i64,
    now: DateTime<Utc>,
) -> Result<ScoringSummary> {
    let cutoff = now - Duration::days(lookback_days);
    let candidates = post_repo::scoring_candidates(pool, cutoff).await?;

    let mut summary = ScoringSummary::default();

    for post in &candidates {
        match score_one(pool, graph, settings, post, now).await {
            Ok(score) => {
                debug!(post_id = %post.id, score, "scored post");
                summary.scored += 1;
            }
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "scoring failed, retrying next cycle");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

async fn score_one(
    pool: &PgPool,
    graph: &dyn FollowGraph,
    settings: &TrendingSettings,
    post: &Post,
    now: DateTime<Utc>,
) -> Result<f64> {
    let since = now - Duration::hours(BUCKET_WINDOW_HOURS);
    let buckets = engagement_repo::buckets_for_post(pool, post.id, since).await?;

    let follower_count = graph.follower_count(post.author_id).await?;
    let score = compute_score(&buckets, follower_count, settings, now);

    post_repo::update_trending_score(pool, post.id, score, follower_count).await?;

    Ok(score)
}
