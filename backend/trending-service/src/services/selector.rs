//! Trending selector
//!
//! Runs once per scoring cycle over the freshly-scored candidates:
//! gate on age and score/raw-count floors, rank by score, cap the
//! selection, and write status/rank back to posts.
//!
//! The percent cap and the count cap combine via `min()` — the more
//! conservative, flood-avoiding reading. This is a deliberate policy
//! decision locked in by a regression test; do not change it to `max()`
//! without revisiting feed injection volume.
//!
//! A post that drops below threshold mid-cycle stays trending until the
//! next full selector run. That is designed behavior, not a bug.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::post_repo;
use crate::error::Result;
use crate::models::{CumulativeCounters, EngagementThresholds, Post, TrendingSettings};

/// Selector input: one scored post
#[derive(Debug, Clone)]
pub struct Candidate {
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub score: f64,
    pub counters: CumulativeCounters,
}

impl From<&Post> for Candidate {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.id,
            created_at: post.created_at,
            score: post.trending_score,
            counters: post.cumulative_counters(),
        }
    }
}

fn meets_raw_thresholds(c: &CumulativeCounters, t: &EngagementThresholds) -> bool {
    c.views >= t.views
        && c.likes >= t.likes
        && c.comments >= t.comments
        && c.saves >= t.saves
        && c.shares >= t.shares
}

/// Eligibility gate: old enough, and either the composite score or every
/// raw cumulative counter clears its floor. The OR lets score-poor but
/// high-raw-engagement posts still surface.
pub fn is_eligible(c: &Candidate, settings: &TrendingSettings, now: DateTime<Utc>) -> bool {
    let age_hours = (now - c.created_at).num_minutes() as f64 / 60.0;
    if age_hours < settings.delay_hours {
        return false;
    }

    c.score >= settings.min_trending_score
        || meets_raw_thresholds(&c.counters, &settings.min_engagement_threshold)
}

/// Selection size = max(1, min(ceil(percent), count)) over the eligible set
pub fn selection_size(total_eligible: usize, settings: &TrendingSettings) -> usize {
    if total_eligible == 0 {
        return 0;
    }

    let by_percent =
        (settings.trending_top_percent / 100.0 * total_eligible as f64).ceil() as usize;
    let by_count = settings.trending_top_count.max(0) as usize;

    by_percent.min(by_count).max(1)
}

/// Rank eligible candidates and pick the trending set.
///
/// Ordering is score descending with post id ascending as the tie-break,
/// so two runs over identical inputs assign identical ranks (no flapping).
pub fn select(
    candidates: &[Candidate],
    settings: &TrendingSettings,
    now: DateTime<Utc>,
) -> Vec<(Uuid, i32)> {
    let mut eligible: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| is_eligible(c, settings, now))
        .collect();

    eligible.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.post_id.cmp(&b.post_id))
    });

    let size = selection_size(eligible.len(), settings);

    eligible
        .into_iter()
        .take(size)
        .enumerate()
        .map(|(i, c)| (c.post_id, (i + 1) as i32))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SelectionSummary {
    pub candidates: usize,
    pub selected: usize,
    pub demoted: u64,
    /// Posts whose status transitioned false→true this run
    pub newly_trending: Vec<Uuid>,
}

/// Apply a full selection pass against the store.
///
/// Posts outside the lookback window are never promoted, and any
/// previously-trending post missing from the selection (including aged-out
/// ones) is demoted, keeping ranks a contiguous 1..N sequence.
pub async fn run_selection_pass(
    pool: &PgPool,
    settings: &TrendingSettings,
    lookback_days: i64,
    now: DateTime<Utc>,
) -> Result<SelectionSummary> {
    let cutoff = now - Duration::days(lookback_days);
    let posts = post_repo::scoring_candidates(pool, cutoff).await?;
    let candidates: Vec<Candidate> = posts.iter().map(Candidate::from).collect();

    let ranked = select(&candidates, settings, now);
    let keep: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();

    let newly_trending = post_repo::not_yet_trending(pool, &keep).await?;

    for (post_id, rank) in &ranked {
        post_repo::promote(pool, *post_id, *rank, now).await?;
    }
    let demoted = post_repo::demote_except(pool, &keep).await?;

    info!(
        candidates = candidates.len(),
        selected = ranked.len(),
        promoted = newly_trending.len(),
        demoted,
        "selection pass applied"
    );

    Ok(SelectionSummary {
        candidates: candidates.len(),
        selected: ranked.len(),
        demoted,
        newly_trending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: f64, age_hours: i64, now: DateTime<Utc>) -> Candidate {
        Candidate {
            post_id: Uuid::new_v4(),
            created_at: now - Duration::hours(age_hours),
            score,
            counters: CumulativeCounters::default(),
        }
    }

    fn settings(now: DateTime<Utc>) -> TrendingSettings {
        TrendingSettings::with_defaults(now)
    }

    #[test]
    fn test_age_gate_blocks_young_posts_regardless_of_score() {
        let now = Utc::now();
        let s = settings(now);

        // default delay_hours = 2
        let young = candidate(1000.0, 1, now);
        let old = candidate(1000.0, 3, now);

        assert!(!is_eligible(&young, &s, now));
        assert!(is_eligible(&old, &s, now));
    }

    #[test]
    fn test_raw_thresholds_qualify_score_poor_posts() {
        let now = Utc::now();
        let s = settings(now);

        let mut c = candidate(0.5, 5, now);
        assert!(!is_eligible(&c, &s, now));

        // all five cumulative floors met → eligible despite the low score
        c.counters = CumulativeCounters {
            views: 100,
            likes: 20,
            comments: 5,
            saves: 3,
            shares: 2,
        };
        assert!(is_eligible(&c, &s, now));

        // one metric below its floor breaks the AND
        c.counters.shares = 1;
        assert!(!is_eligible(&c, &s, now));
    }

    #[test]
    fn test_caps_combine_via_min_not_max() {
        // Regression lock for the documented policy decision: with 100
        // eligible posts, 5% (=5) and top_count=500 must combine to 5.
        let now = Utc::now();
        let s = settings(now);
        assert_eq!(selection_size(100, &s), 5);

        // and the count cap wins when it is the smaller one
        let mut tight = settings(now);
        tight.trending_top_count = 10;
        tight.trending_top_percent = 50.0;
        assert_eq!(selection_size(100, &tight), 10);
    }

    #[test]
    fn test_selection_size_floors_at_one_for_nonempty_eligible() {
        let now = Utc::now();
        let mut s = settings(now);
        s.trending_top_percent = 0.1;
        assert_eq!(selection_size(1, &s), 1);
        assert_eq!(selection_size(0, &s), 0);
    }

    #[test]
    fn test_ranks_are_contiguous_and_ordered_by_score() {
        let now = Utc::now();
        let mut s = settings(now);
        s.trending_top_percent = 50.0;

        let candidates: Vec<Candidate> =
            (0..10).map(|i| candidate(10.0 + i as f64, 5, now)).collect();

        let ranked = select(&candidates, &s, now);
        assert_eq!(ranked.len(), 5);

        let ranks: Vec<i32> = ranked.iter().map(|(_, r)| *r).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);

        // rank 1 is the highest score (19.0)
        let top = candidates
            .iter()
            .find(|c| c.post_id == ranked[0].0)
            .unwrap();
        assert_eq!(top.score, 19.0);
    }

    #[test]
    fn test_ties_break_by_ascending_post_id() {
        let now = Utc::now();
        let mut s = settings(now);
        s.trending_top_percent = 50.0;

        // four tied candidates, fed in descending id order; 50% selects two
        let candidates: Vec<Candidate> = (1u128..=4)
            .rev()
            .map(|i| {
                let mut c = candidate(7.0, 5, now);
                c.post_id = Uuid::from_u128(i);
                c
            })
            .collect();

        let ranked = select(&candidates, &s, now);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, Uuid::from_u128(1));
        assert_eq!(ranked[1].0, Uuid::from_u128(2));
    }

    #[test]
    fn test_selection_is_idempotent_for_identical_inputs() {
        let now = Utc::now();
        let mut s = settings(now);
        s.trending_top_percent = 30.0;

        let candidates: Vec<Candidate> = (0..20)
            .map(|i| candidate((i * 7 % 13) as f64 + 2.0, 4 + i, now))
            .collect();

        let first = select(&candidates, &s, now);
        let second = select(&candidates, &s, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_documented_scenario_age_gate_then_eligibility() {
        // Post created at T0 with strong engagement: below the age gate at
        // T0+1h, eligible once re-evaluated past it at T0+3h.
        let t0 = Utc::now() - Duration::hours(3);
        let s = settings(t0);

        let c = Candidate {
            post_id: Uuid::new_v4(),
            created_at: t0,
            score: 100.0,
            counters: CumulativeCounters {
                views: 100,
                likes: 20,
                comments: 5,
                saves: 3,
                shares: 2,
            },
        };

        assert!(!is_eligible(&c, &s, t0 + Duration::hours(1)));
        assert!(is_eligible(&c, &s, t0 + Duration::hours(3)));
    }
}
