/// Settings repository
///
/// One singleton row (id = 1) holds the admin-tunable trending
/// configuration. The `version` column implements optimistic concurrency:
/// a write racing another admin's update is detected and rejected with a
/// conflict instead of silently overwriting it.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{EngagementThresholds, MetricWeights, TrendingSettings};

type SettingsRow = (
    f64,                  // delay_hours
    f64,                  // min_trending_score
    serde_json::Value,    // min_engagement_threshold
    serde_json::Value,    // weights
    f64,                  // decay_constant
    f64,                  // trending_top_percent
    i64,                  // trending_top_count
    Option<Uuid>,         // last_updated_by
    DateTime<Utc>,        // last_updated_at
    i64,                  // version
);

fn from_row(row: SettingsRow) -> Result<TrendingSettings> {
    let (
        delay_hours,
        min_trending_score,
        thresholds,
        weights,
        decay_constant,
        trending_top_percent,
        trending_top_count,
        last_updated_by,
        last_updated_at,
        version,
    ) = row;

    let min_engagement_threshold: EngagementThresholds = serde_json::from_value(thresholds)?;
    let weights: MetricWeights = serde_json::from_value(weights)?;

    Ok(TrendingSettings {
        delay_hours,
        min_trending_score,
        min_engagement_threshold,
        weights,
        decay_constant,
        trending_top_percent,
        trending_top_count,
        last_updated_by,
        last_updated_at,
        version,
    })
}

const SETTINGS_COLUMNS: &str = "delay_hours, min_trending_score, min_engagement_threshold, \
     weights, decay_constant, trending_top_percent, trending_top_count, \
     last_updated_by, last_updated_at, version";

/// Fetch the singleton, lazily creating it with documented defaults
pub async fn get_or_create(pool: &PgPool, now: DateTime<Utc>) -> Result<TrendingSettings> {
    let defaults = TrendingSettings::with_defaults(now);

    sqlx::query(
        "INSERT INTO trending_settings \
         (id, delay_hours, min_trending_score, min_engagement_threshold, weights, \
          decay_constant, trending_top_percent, trending_top_count, last_updated_at, version) \
         VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(defaults.delay_hours)
    .bind(defaults.min_trending_score)
    .bind(serde_json::to_value(defaults.min_engagement_threshold)?)
    .bind(serde_json::to_value(defaults.weights)?)
    .bind(defaults.decay_constant)
    .bind(defaults.trending_top_percent)
    .bind(defaults.trending_top_count)
    .bind(defaults.last_updated_at)
    .bind(defaults.version)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, SettingsRow>(&format!(
        "SELECT {SETTINGS_COLUMNS} FROM trending_settings WHERE id = 1"
    ))
    .fetch_one(pool)
    .await?;

    from_row(row)
}

/// Persist a full settings value, guarded by the version it was read at.
/// Returns the stored value with its bumped version.
pub async fn save(
    pool: &PgPool,
    settings: &TrendingSettings,
    expected_version: i64,
) -> Result<TrendingSettings> {
    let row = sqlx::query_as::<_, SettingsRow>(&format!(
        "UPDATE trending_settings \
         SET delay_hours = $1, min_trending_score = $2, min_engagement_threshold = $3, \
             weights = $4, decay_constant = $5, trending_top_percent = $6, \
             trending_top_count = $7, last_updated_by = $8, last_updated_at = $9, \
             version = version + 1 \
         WHERE id = 1 AND version = $10 \
         RETURNING {SETTINGS_COLUMNS}"
    ))
    .bind(settings.delay_hours)
    .bind(settings.min_trending_score)
    .bind(serde_json::to_value(settings.min_engagement_threshold)?)
    .bind(serde_json::to_value(settings.weights)?)
    .bind(settings.decay_constant)
    .bind(settings.trending_top_percent)
    .bind(settings.trending_top_count)
    .bind(settings.last_updated_by)
    .bind(settings.last_updated_at)
    .bind(expected_version)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => from_row(row),
        None => Err(AppError::Conflict(
            "settings were modified concurrently, retry".to_string(),
        )),
    }
}
