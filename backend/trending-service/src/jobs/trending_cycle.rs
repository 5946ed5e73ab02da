//! Trending Cycle Background Job
//!
//! Periodic single-flight batch: score posts inside the lookback window,
//! run the selector, inject newly trending posts into discovery feeds,
//! and sweep stale engagement buckets.
//!
//! A lease (Redis when configured, process-local otherwise) prevents two
//! instances from racing rank assignment. Settings are snapshotted once
//! per cycle so scoring and selection see one consistent configuration.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::cache::TrendingCache;
use crate::clients::FollowGraph;
use crate::config::EngineConfig;
use crate::db::{engagement_repo, post_repo};
use crate::error::Result;
use crate::metrics;
use crate::services::fanout::{self, InjectionConfig};
use crate::services::{scoring, selector, SettingsCache};

#[derive(Clone)]
pub struct CycleContext {
    pub pool: PgPool,
    pub cache: TrendingCache,
    pub settings: Arc<SettingsCache>,
    pub graph: Arc<dyn FollowGraph>,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    pub ran: bool,
    pub scored: usize,
    pub score_failures: usize,
    pub trending: usize,
    pub promoted: usize,
    pub demoted: u64,
}

pub async fn start_trending_cycle(ctx: CycleContext) {
    info!(
        interval_secs = ctx.engine.cycle_interval_secs,
        lookback_days = ctx.engine.scoring_lookback_days,
        "starting trending cycle background job"
    );

    let interval = Duration::from_secs(ctx.engine.cycle_interval_secs);

    loop {
        sleep(interval).await;

        let started = Instant::now();
        match run_cycle(&ctx).await {
            Ok(summary) if summary.ran => {
                metrics::record_cycle("success", started.elapsed(), summary.trending);
                info!(
                    duration_ms = started.elapsed().as_millis(),
                    scored = summary.scored,
                    score_failures = summary.score_failures,
                    trending = summary.trending,
                    promoted = summary.promoted,
                    demoted = summary.demoted,
                    "trending cycle completed"
                );
            }
            Ok(_) => {
                metrics::record_cycle("skipped", started.elapsed(), 0);
                info!("trending cycle skipped, lease unavailable");
            }
            Err(e) => {
                metrics::record_cycle("error", started.elapsed(), 0);
                warn!(error = %e, "trending cycle failed");
            }
        }
    }
}

/// One full scorer+selector pass. Re-running with identical inputs and no
/// elapsed time yields an identical assignment.
pub async fn run_cycle(ctx: &CycleContext) -> Result<CycleSummary> {
    if !ctx.cache.acquire_lease(ctx.engine.lease_ttl_secs).await {
        return Ok(CycleSummary::default());
    }

    let result = run_locked(ctx).await;
    ctx.cache.release_lease().await;
    result
}

async fn run_locked(ctx: &CycleContext) -> Result<CycleSummary> {
    let now = chrono::Utc::now();
    let settings = ctx.settings.get(&ctx.pool).await?;
    let lookback = ctx.engine.scoring_lookback_days;

    let scoring = scoring::run_scoring_pass(
        &ctx.pool,
        ctx.graph.as_ref(),
        &settings,
        lookback,
        now,
    )
    .await?;

    let selection = selector::run_selection_pass(&ctx.pool, &settings, lookback, now).await?;

    // Discovery injection for posts that just started trending
    let injection = InjectionConfig {
        rate_cap: ctx.engine.trending_injection_cap,
        audience_limit: ctx.engine.injection_audience,
        retention: ctx.engine.feed_retention,
    };
    for post_id in &selection.newly_trending {
        let Some(post) = post_repo::find_by_id(&ctx.pool, *post_id).await? else {
            continue;
        };
        if let Err(e) = fanout::on_post_trending(
            &ctx.pool,
            ctx.graph.as_ref(),
            post.id,
            post.author_id,
            injection,
            now,
        )
        .await
        {
            warn!(post_id = %post_id, error = %e, "trending injection deferred to next cycle");
        }
    }

    let swept = engagement_repo::delete_stale_buckets(&ctx.pool, now).await?;
    if swept > 0 {
        info!(swept, "stale engagement buckets removed");
    }

    ctx.cache.invalidate_trending().await;

    Ok(CycleSummary {
        ran: true,
        scored: scoring.scored,
        score_failures: scoring.skipped,
        trending: selection.selected,
        promoted: selection.newly_trending.len(),
        demoted: selection.demoted,
    })
}
