/// Domain models for the trending/feed engine
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Engagement event kind
///
/// The five scored metrics plus telemetry kinds that feed other features
/// (profile pages, call buttons, video players) but never trending scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    View,
    Like,
    Comment,
    Save,
    Share,
    ProfileView,
    CallClick,
    VideoPlay,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Save => "save",
            Self::Share => "share",
            Self::ProfileView => "profile_view",
            Self::CallClick => "call_click",
            Self::VideoPlay => "video_play",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Self::View),
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "save" => Some(Self::Save),
            "share" => Some(Self::Share),
            "profile_view" => Some(Self::ProfileView),
            "call_click" => Some(Self::CallClick),
            "video_play" => Some(Self::VideoPlay),
            _ => None,
        }
    }

    /// Whether this kind contributes to the trending score
    pub fn is_scored(&self) -> bool {
        matches!(
            self,
            Self::View | Self::Like | Self::Comment | Self::Save | Self::Share
        )
    }

    /// Column holding the cumulative counter for this kind
    pub fn counter_column(&self) -> &'static str {
        match self {
            Self::View => "views_count",
            Self::Like => "likes_count",
            Self::Comment => "comments_count",
            Self::Save => "saves_count",
            Self::Share => "shares_count",
            Self::ProfileView => "profile_views_count",
            Self::CallClick => "call_clicks_count",
            Self::VideoPlay => "video_plays_count",
        }
    }

    /// Bucket column for scored kinds (telemetry kinds are not bucketed)
    pub fn bucket_column(&self) -> Option<&'static str> {
        match self {
            Self::View => Some("views"),
            Self::Like => Some("likes"),
            Self::Comment => Some("comments"),
            Self::Save => Some("saves"),
            Self::Share => Some("shares"),
            _ => None,
        }
    }
}

impl std::fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Post with the engagement fields owned by this service
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub published: bool,
    pub follower_count_at_scoring: i64,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub saves_count: i64,
    pub shares_count: i64,
    pub trending_score: f64,
    pub trending_status: bool,
    pub trending_rank: Option<i32>,
    pub trending_since: Option<DateTime<Utc>>,
    pub flagged_count: i32,
}

impl Post {
    pub fn cumulative_counters(&self) -> CumulativeCounters {
        CumulativeCounters {
            views: self.views_count,
            likes: self.likes_count,
            comments: self.comments_count,
            saves: self.saves_count,
            shares: self.shares_count,
        }
    }
}

/// Cumulative counters for the five scored metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeCounters {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub saves: i64,
    pub shares: i64,
}

/// One hourly engagement bucket for a post
///
/// `bucket_hour` is the event timestamp truncated to the hour. Only the
/// trailing 24 buckets are live; older rows are ignored on read and swept
/// each cycle, giving ring semantics without unbounded history.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EngagementBucket {
    pub bucket_hour: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub saves: i64,
    pub shares: i64,
}

/// Per-metric scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub saves: f64,
    pub shares: f64,
    pub follower_norm: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            views: 1.0,
            likes: 5.0,
            comments: 3.0,
            saves: 4.0,
            shares: 10.0,
            follower_norm: 0.5,
        }
    }
}

/// Raw-count floors used by the eligibility gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementThresholds {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub saves: i64,
    pub shares: i64,
}

impl Default for EngagementThresholds {
    fn default() -> Self {
        Self {
            views: 100,
            likes: 20,
            comments: 5,
            saves: 3,
            shares: 2,
        }
    }
}

/// Singleton admin-tunable trending configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSettings {
    pub delay_hours: f64,
    pub min_trending_score: f64,
    pub min_engagement_threshold: EngagementThresholds,
    pub weights: MetricWeights,
    pub decay_constant: f64,
    pub trending_top_percent: f64,
    pub trending_top_count: i64,
    pub last_updated_by: Option<Uuid>,
    pub last_updated_at: DateTime<Utc>,
    pub version: i64,
}

impl TrendingSettings {
    /// Documented baseline configuration, used for lazy creation and reset
    pub fn with_defaults(now: DateTime<Utc>) -> Self {
        Self {
            delay_hours: 2.0,
            min_trending_score: 2.0,
            min_engagement_threshold: EngagementThresholds::default(),
            weights: MetricWeights::default(),
            decay_constant: 12.0,
            trending_top_percent: 5.0,
            trending_top_count: 500,
            last_updated_by: None,
            last_updated_at: now,
            version: 1,
        }
    }
}

/// Partial update payload for PUT /trending/settings
///
/// Nested objects are merged key-by-key, never wholesale-replaced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingSettingsPatch {
    pub delay_hours: Option<f64>,
    pub min_trending_score: Option<f64>,
    pub min_engagement_threshold: Option<EngagementThresholdsPatch>,
    pub weights: Option<MetricWeightsPatch>,
    pub decay_constant: Option<f64>,
    pub trending_top_percent: Option<f64>,
    pub trending_top_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricWeightsPatch {
    pub views: Option<f64>,
    pub likes: Option<f64>,
    pub comments: Option<f64>,
    pub saves: Option<f64>,
    pub shares: Option<f64>,
    pub follower_norm: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngagementThresholdsPatch {
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
}

/// Origin of a feed inbox entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Follow,
    Trending,
    Other,
}

impl FeedSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Trending => "trending",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "follow" => Some(Self::Follow),
            "trending" => Some(Self::Trending),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a user's precomputed feed inbox
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedItem {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub inserted_at: DateTime<Utc>,
    pub source: String,
}

/// Offset pagination envelope
///
/// `total` is the pre-filter item count; tombstone filtering in the reader
/// may return fewer posts than `limit` for a fully-populated page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_kind_parse_round_trip() {
        for kind in [
            EngagementKind::View,
            EngagementKind::Like,
            EngagementKind::Comment,
            EngagementKind::Save,
            EngagementKind::Share,
            EngagementKind::ProfileView,
            EngagementKind::CallClick,
            EngagementKind::VideoPlay,
        ] {
            assert_eq!(EngagementKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EngagementKind::parse("upvote"), None);
    }

    #[test]
    fn test_only_core_metrics_are_scored() {
        assert!(EngagementKind::View.is_scored());
        assert!(EngagementKind::Share.is_scored());
        assert!(!EngagementKind::ProfileView.is_scored());
        assert!(!EngagementKind::CallClick.is_scored());
        assert!(!EngagementKind::VideoPlay.is_scored());
    }

    #[test]
    fn test_telemetry_kinds_have_no_bucket_column() {
        assert_eq!(EngagementKind::Like.bucket_column(), Some("likes"));
        assert_eq!(EngagementKind::VideoPlay.bucket_column(), None);
    }

    #[test]
    fn test_feed_source_parse() {
        assert_eq!(FeedSource::parse("follow"), Some(FeedSource::Follow));
        assert_eq!(FeedSource::parse("trending"), Some(FeedSource::Trending));
        assert_eq!(FeedSource::parse("ads"), None);
    }

    #[test]
    fn test_default_weights_match_documented_baseline() {
        let w = MetricWeights::default();
        assert_eq!(w.views, 1.0);
        assert_eq!(w.likes, 5.0);
        assert_eq!(w.comments, 3.0);
        assert_eq!(w.saves, 4.0);
        assert_eq!(w.shares, 10.0);
        assert_eq!(w.follower_norm, 0.5);
    }
}
