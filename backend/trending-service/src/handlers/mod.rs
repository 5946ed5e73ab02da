pub mod analytics;
pub mod events;
pub mod feed;
pub mod settings;
pub mod trending;

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::TrendingCache;
use crate::clients::FollowGraph;
use crate::config::EngineConfig;
use crate::services::SettingsCache;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: TrendingCache,
    pub settings: Arc<SettingsCache>,
    pub graph: Arc<dyn FollowGraph>,
    pub engine: EngineConfig,
}

pub use analytics::get_trending_analytics;
pub use events::{publish_fanout, record_event};
pub use feed::get_feed;
pub use settings::{get_settings, reset_settings, update_settings};
pub use trending::get_trending;
