//! Settings store
//!
//! One persisted, versioned configuration record governs scoring and
//! selection. Reads are frequent and served from a short-TTL in-process
//! cache; batch cycles take one snapshot per run for internal consistency.
//! Updates validate every present field before applying any mutation and
//! merge nested objects key-by-key.

use chrono::Utc;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::settings_repo;
use crate::error::{AppError, Result};
use crate::models::{TrendingSettings, TrendingSettingsPatch};

/// Default TTL for the in-process settings cache
const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(30);

/// Short-TTL snapshot cache over the singleton settings row
pub struct SettingsCache {
    ttl: Duration,
    inner: RwLock<Option<(Instant, TrendingSettings)>>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new(SETTINGS_CACHE_TTL)
    }
}

impl SettingsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(None),
        }
    }

    /// Current settings, lazily created with defaults on first access
    pub async fn get(&self, pool: &PgPool) -> Result<TrendingSettings> {
        if let Some((at, cached)) = self.inner.read().await.as_ref() {
            if at.elapsed() < self.ttl {
                return Ok(cached.clone());
            }
        }

        let fresh = settings_repo::get_or_create(pool, Utc::now()).await?;
        *self.inner.write().await = Some((Instant::now(), fresh.clone()));
        Ok(fresh)
    }

    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn check_min(field: &str, value: f64, min: f64) -> Result<()> {
    if !value.is_finite() || value < min {
        return Err(AppError::Validation(format!(
            "{field} must be at least {min}, got {value}"
        )));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(AppError::Validation(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

/// Validate every present field; fails on the first invalid one, naming it.
/// No mutation happens before validation succeeds in full.
pub fn validate_patch(patch: &TrendingSettingsPatch) -> Result<()> {
    if let Some(v) = patch.delay_hours {
        check_range("delay_hours", v, 1.0, 3.0)?;
    }
    if let Some(v) = patch.min_trending_score {
        check_min("min_trending_score", v, 0.0)?;
    }
    if let Some(t) = &patch.min_engagement_threshold {
        for (field, value) in [
            ("min_engagement_threshold.views", t.views),
            ("min_engagement_threshold.likes", t.likes),
            ("min_engagement_threshold.comments", t.comments),
            ("min_engagement_threshold.saves", t.saves),
            ("min_engagement_threshold.shares", t.shares),
        ] {
            if let Some(v) = value {
                check_non_negative(field, v)?;
            }
        }
    }
    if let Some(w) = &patch.weights {
        for (field, value) in [
            ("weights.views", w.views),
            ("weights.likes", w.likes),
            ("weights.comments", w.comments),
            ("weights.saves", w.saves),
            ("weights.shares", w.shares),
            ("weights.follower_norm", w.follower_norm),
        ] {
            if let Some(v) = value {
                check_min(field, v, 0.0)?;
            }
        }
    }
    if let Some(v) = patch.decay_constant {
        check_min("decay_constant", v, 1.0)?;
    }
    if let Some(v) = patch.trending_top_percent {
        check_range("trending_top_percent", v, 0.1, 50.0)?;
    }
    if let Some(v) = patch.trending_top_count {
        if !(10..=5000).contains(&v) {
            return Err(AppError::Validation(format!(
                "trending_top_count must be between 10 and 5000, got {v}"
            )));
        }
    }

    Ok(())
}

/// Merge a validated patch onto the current value. Nested objects are
/// merged key-by-key, never wholesale-replaced.
pub fn apply_patch(
    current: &TrendingSettings,
    patch: &TrendingSettingsPatch,
    admin_id: Uuid,
) -> TrendingSettings {
    let mut next = current.clone();

    if let Some(v) = patch.delay_hours {
        next.delay_hours = v;
    }
    if let Some(v) = patch.min_trending_score {
        next.min_trending_score = v;
    }
    if let Some(t) = &patch.min_engagement_threshold {
        let dst = &mut next.min_engagement_threshold;
        if let Some(v) = t.views {
            dst.views = v;
        }
        if let Some(v) = t.likes {
            dst.likes = v;
        }
        if let Some(v) = t.comments {
            dst.comments = v;
        }
        if let Some(v) = t.saves {
            dst.saves = v;
        }
        if let Some(v) = t.shares {
            dst.shares = v;
        }
    }
    if let Some(w) = &patch.weights {
        let dst = &mut next.weights;
        if let Some(v) = w.views {
            dst.views = v;
        }
        if let Some(v) = w.likes {
            dst.likes = v;
        }
        if let Some(v) = w.comments {
            dst.comments = v;
        }
        if let Some(v) = w.saves {
            dst.saves = v;
        }
        if let Some(v) = w.shares {
            dst.shares = v;
        }
        if let Some(v) = w.follower_norm {
            dst.follower_norm = v;
        }
    }
    if let Some(v) = patch.decay_constant {
        next.decay_constant = v;
    }
    if let Some(v) = patch.trending_top_percent {
        next.trending_top_percent = v;
    }
    if let Some(v) = patch.trending_top_count {
        next.trending_top_count = v;
    }

    next.last_updated_by = Some(admin_id);
    next.last_updated_at = Utc::now();
    next
}

pub async fn get_settings(pool: &PgPool, cache: &SettingsCache) -> Result<TrendingSettings> {
    cache.get(pool).await
}

/// Validate-then-apply partial update; rejects wholesale on the first
/// invalid field with no partial application.
pub async fn update_settings(
    pool: &PgPool,
    cache: &SettingsCache,
    patch: &TrendingSettingsPatch,
    admin_id: Uuid,
) -> Result<TrendingSettings> {
    validate_patch(patch)?;

    let current = settings_repo::get_or_create(pool, Utc::now()).await?;
    let next = apply_patch(&current, patch, admin_id);
    let saved = settings_repo::save(pool, &next, current.version).await?;

    cache.invalidate().await;
    Ok(saved)
}

/// Restore the documented baseline constants atomically
pub async fn reset_to_defaults(
    pool: &PgPool,
    cache: &SettingsCache,
    admin_id: Uuid,
) -> Result<TrendingSettings> {
    let current = settings_repo::get_or_create(pool, Utc::now()).await?;

    let mut defaults = TrendingSettings::with_defaults(Utc::now());
    defaults.last_updated_by = Some(admin_id);
    let saved = settings_repo::save(pool, &defaults, current.version).await?;

    cache.invalidate().await;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngagementThresholdsPatch, MetricWeightsPatch};

    #[test]
    fn test_zero_decay_constant_is_rejected() {
        let patch = TrendingSettingsPatch {
            decay_constant: Some(0.0),
            ..Default::default()
        };
        let err = validate_patch(&patch).unwrap_err();
        assert!(err.to_string().contains("decay_constant"));
    }

    #[test]
    fn test_top_count_below_minimum_is_rejected() {
        let patch = TrendingSettingsPatch {
            trending_top_count: Some(5),
            ..Default::default()
        };
        let err = validate_patch(&patch).unwrap_err();
        assert!(err.to_string().contains("trending_top_count"));
    }

    #[test]
    fn test_delay_hours_range() {
        for bad in [0.5, 3.5, f64::NAN] {
            let patch = TrendingSettingsPatch {
                delay_hours: Some(bad),
                ..Default::default()
            };
            assert!(validate_patch(&patch).is_err());
        }
        let patch = TrendingSettingsPatch {
            delay_hours: Some(1.0),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_ok());
    }

    #[test]
    fn test_top_percent_bounds() {
        let low = TrendingSettingsPatch {
            trending_top_percent: Some(0.05),
            ..Default::default()
        };
        let high = TrendingSettingsPatch {
            trending_top_percent: Some(51.0),
            ..Default::default()
        };
        assert!(validate_patch(&low).is_err());
        assert!(validate_patch(&high).is_err());
    }

    #[test]
    fn test_first_invalid_field_is_named() {
        // delay_hours is checked before trending_top_count
        let patch = TrendingSettingsPatch {
            delay_hours: Some(10.0),
            trending_top_count: Some(1),
            ..Default::default()
        };
        let err = validate_patch(&patch).unwrap_err();
        assert!(err.to_string().contains("delay_hours"));
    }

    #[test]
    fn test_nested_objects_merge_key_by_key() {
        let now = Utc::now();
        let current = TrendingSettings::with_defaults(now);
        let admin = Uuid::new_v4();

        let patch = TrendingSettingsPatch {
            weights: Some(MetricWeightsPatch {
                shares: Some(20.0),
                ..Default::default()
            }),
            min_engagement_threshold: Some(EngagementThresholdsPatch {
                views: Some(250),
                ..Default::default()
            }),
            ..Default::default()
        };

        let next = apply_patch(&current, &patch, admin);

        assert_eq!(next.weights.shares, 20.0);
        // untouched sibling keys survive the merge
        assert_eq!(next.weights.likes, current.weights.likes);
        assert_eq!(next.min_engagement_threshold.views, 250);
        assert_eq!(
            next.min_engagement_threshold.likes,
            current.min_engagement_threshold.likes
        );
        assert_eq!(next.last_updated_by, Some(admin));
    }

    #[test]
    fn test_apply_patch_preserves_version_for_repo_bump() {
        let now = Utc::now();
        let mut current = TrendingSettings::with_defaults(now);
        current.version = 7;

        let next = apply_patch(&current, &TrendingSettingsPatch::default(), Uuid::new_v4());
        assert_eq!(next.version, 7);
    }

    #[test]
    fn test_defaults_match_documented_baseline() {
        let s = TrendingSettings::with_defaults(Utc::now());
        assert_eq!(s.delay_hours, 2.0);
        assert_eq!(s.min_trending_score, 2.0);
        assert_eq!(s.decay_constant, 12.0);
        assert_eq!(s.trending_top_percent, 5.0);
        assert_eq!(s.trending_top_count, 500);
        assert_eq!(s.last_updated_by, None);
    }
}
