//! Feed reader
//!
//! Serves paginated, resolved feeds from the fan-out store. Items whose
//! post no longer exists or is no longer published are filtered silently
//! rather than failing the request, so pagination totals reflect the
//! pre-filter count. A fully-populated page can therefore return fewer
//! posts than `limit`; this is a documented, tested inconsistency.

use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::{feed_repo, post_repo};
use crate::error::Result;
use crate::models::{FeedItem, FeedSource, Pagination, Post};

/// One resolved feed entry
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub post: Post,
    pub source: String,
    pub inserted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<FeedEntry>,
    pub pagination: Pagination,
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Resolve inbox items against their posts, preserving item order and
/// dropping tombstones (ids absent from `posts`).
pub fn resolve_items(items: Vec<FeedItem>, posts: &HashMap<Uuid, Post>) -> Vec<FeedEntry> {
    items
        .into_iter()
        .filter_map(|item| {
            posts.get(&item.post_id).map(|post| FeedEntry {
                post: post.clone(),
                source: item.source,
                inserted_at: item.inserted_at,
            })
        })
        .collect()
}

/// One page of a user's feed, newest insertions first
pub async fn get_user_feed(
    pool: &PgPool,
    user_id: Uuid,
    page: i64,
    limit: i64,
    source: Option<FeedSource>,
) -> Result<FeedPage> {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    let offset = (page - 1) * limit;

    let total = feed_repo::count_items(pool, user_id, source).await?;
    let items = feed_repo::page_items(pool, user_id, source, limit, offset).await?;

    let ids: Vec<Uuid> = items.iter().map(|i| i.post_id).collect();
    let posts: HashMap<Uuid, Post> = post_repo::find_published_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(FeedPage {
        posts: resolve_items(items, &posts),
        pagination: Pagination {
            page,
            limit,
            total,
            pages: total_pages(total, limit),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(id: Uuid) -> Post {
        Post {
            id,
            author_id: Uuid::new_v4(),
            created_at: Utc::now(),
            published: true,
            follower_count_at_scoring: 0,
            views_count: 0,
            likes_count: 0,
            comments_count: 0,
            saves_count: 0,
            shares_count: 0,
            trending_score: 0.0,
            trending_status: false,
            trending_rank: None,
            trending_since: None,
            flagged_count: 0,
        }
    }

    fn item(user: Uuid, post_id: Uuid, age_mins: i64) -> FeedItem {
        FeedItem {
            user_id: user,
            post_id,
            inserted_at: Utc::now() - chrono::Duration::minutes(age_mins),
            source: "follow".to_string(),
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(100, 0), 0);
    }

    #[test]
    fn test_resolve_drops_tombstones_and_keeps_order() {
        let user = Uuid::new_v4();
        let live_a = Uuid::new_v4();
        let dead = Uuid::new_v4();
        let live_b = Uuid::new_v4();

        let items = vec![item(user, live_a, 1), item(user, dead, 2), item(user, live_b, 3)];
        let posts: HashMap<Uuid, Post> =
            [post(live_a), post(live_b)].into_iter().map(|p| (p.id, p)).collect();

        let resolved = resolve_items(items, &posts);

        // the dangling reference is omitted, order of survivors preserved
        let ids: Vec<Uuid> = resolved.iter().map(|e| e.post.id).collect();
        assert_eq!(ids, vec![live_a, live_b]);
    }

    #[test]
    fn test_resolve_empty_inbox() {
        let resolved = resolve_items(vec![], &HashMap::new());
        assert!(resolved.is_empty());
    }
}
