//! Trending analytics aggregator
//!
//! Read-only summaries over scorer/selector/feed state for admin
//! dashboards. Never mutates posts, settings, or feed items.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::db::post_repo;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EngagementTotals {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub saves: i64,
    pub shares: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyTrendingPoint {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingAnalytics {
    pub days: i64,
    /// Posts that began trending within the window
    pub trending_count: i64,
    /// Posts published within the window
    pub published_count: i64,
    /// trending_count / published_count
    pub conversion_rate: f64,
    pub avg_trending_score: f64,
    /// Mean of trending_since - created_at, in hours
    pub avg_hours_to_trend: f64,
    /// Cumulative engagement across posts trending in the window
    pub engagement_totals: EngagementTotals,
    /// Bucketed engagement over the last 24h for the same posts
    pub last_24h_engagement: EngagementTotals,
    pub daily: Vec<DailyTrendingPoint>,
}

pub fn conversion_rate(trending: i64, published: i64) -> f64 {
    if published <= 0 {
        return 0.0;
    }
    trending as f64 / published as f64
}

pub async fn get_trending_analytics(
    pool: &PgPool,
    days: i64,
    now: DateTime<Utc>,
) -> Result<TrendingAnalytics> {
    let since = now - Duration::days(days);

    let (trending_count, avg_trending_score, avg_hours_to_trend) =
        sqlx::query_as::<_, (i64, f64, f64)>(
            "SELECT COUNT(*), \
                    COALESCE(AVG(trending_score), 0)::FLOAT8, \
                    COALESCE(AVG(EXTRACT(EPOCH FROM (trending_since - created_at)) / 3600.0), 0)::FLOAT8 \
             FROM posts \
             WHERE trending_since >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await?;

    let published_count = post_repo::published_count_since(pool, since).await?;

    let totals = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
        "SELECT COALESCE(SUM(views_count), 0)::BIGINT, \
                COALESCE(SUM(likes_count), 0)::BIGINT, \
                COALESCE(SUM(comments_count), 0)::BIGINT, \
                COALESCE(SUM(saves_count), 0)::BIGINT, \
                COALESCE(SUM(shares_count), 0)::BIGINT \
         FROM posts \
         WHERE trending_since >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    let last_24h = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
        "SELECT COALESCE(SUM(b.views), 0)::BIGINT, \
                COALESCE(SUM(b.likes), 0)::BIGINT, \
                COALESCE(SUM(b.comments), 0)::BIGINT, \
                COALESCE(SUM(b.saves), 0)::BIGINT, \
                COALESCE(SUM(b.shares), 0)::BIGINT \
         FROM post_engagement_buckets b \
         JOIN posts p ON p.id = b.post_id \
         WHERE p.trending_since >= $1 AND b.bucket_hour >= $2",
    )
    .bind(since)
    .bind(now - Duration::hours(24))
    .fetch_one(pool)
    .await?;

    let daily = sqlx::query_as::<_, (NaiveDate, i64)>(
        "SELECT (trending_since AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) \
         FROM posts \
         WHERE trending_since >= $1 \
         GROUP BY 1 \
         ORDER BY 1 ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(day, count)| DailyTrendingPoint { day, count })
    .collect();

    Ok(TrendingAnalytics {
        days,
        trending_count,
        published_count,
        conversion_rate: conversion_rate(trending_count, published_count),
        avg_trending_score,
        avg_hours_to_trend,
        engagement_totals: EngagementTotals {
            views: totals.0,
            likes: totals.1,
            comments: totals.2,
            saves: totals.3,
            shares: totals.4,
        },
        last_24h_engagement: EngagementTotals {
            views: last_24h.0,
            likes: last_24h.1,
            comments: last_24h.2,
            saves: last_24h.3,
            shares: last_24h.4,
        },
        daily,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_rate() {
        assert_eq!(conversion_rate(5, 100), 0.05);
        assert_eq!(conversion_rate(0, 100), 0.0);
        // no published posts in window → defined as zero, not NaN
        assert_eq!(conversion_rate(3, 0), 0.0);
    }
}
