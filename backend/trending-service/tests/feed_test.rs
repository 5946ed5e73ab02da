//! Feed resolution and pagination properties

use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use trending_service::models::{FeedItem, Post};
use trending_service::services::fanout::injection_allowed;
use trending_service::services::feed::{resolve_items, total_pages};

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

/// An inbox of `n` items ordered newest-first, the way the repo returns them
fn inbox(user: Uuid, n: usize) -> Vec<FeedItem> {
    (0..n)
        .map(|i| FeedItem {
            user_id: user,
            post_id: Uuid::from_u128(i as u128 + 1),
            inserted_at: Utc::now() - Duration::minutes(i as i64),
            source: "follow".to_string(),
        })
        .collect()
}

#[test]
fn consecutive_pages_are_disjoint_and_cover_the_inbox() {
    let user = Uuid::new_v4();
    let items = inbox(user, 47);
    let posts: HashMap<Uuid, Post> = items
        .iter()
        .map(|i| (i.post_id, post(i.post_id)))
        .collect();

    let limit = 20;
    let mut seen = HashSet::new();
    let mut covered = 0;

    for chunk in items.chunks(limit) {
        let page = resolve_items(chunk.to_vec(), &posts);
        for entry in &page {
            assert!(seen.insert(entry.post.id), "post served on two pages");
        }
        covered += page.len();
    }

    assert_eq!(covered, items.len());
    assert_eq!(total_pages(items.len() as i64, limit as i64), 3);
}

#[test]
fn tombstoned_post_shrinks_its_page_without_shifting_others() {
    let user = Uuid::new_v4();
    let items = inbox(user, 10);

    // post 4 was unpublished after fan-out
    let posts: HashMap<Uuid, Post> = items
        .iter()
        .filter(|i| i.post_id != Uuid::from_u128(4))
        .map(|i| (i.post_id, post(i.post_id)))
        .collect();

    let limit = 5;
    let first = resolve_items(items[..limit].to_vec(), &posts);
    let second = resolve_items(items[limit..].to_vec(), &posts);

    // the tombstone sat on page one, so that page comes back short while
    // the pre-filter total still counts it
    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 5);
    assert_eq!(total_pages(items.len() as i64, limit as i64), 2);

    let first_ids: Vec<Uuid> = first.iter().map(|e| e.post.id).collect();
    assert_eq!(
        first_ids,
        vec![
            Uuid::from_u128(1),
            Uuid::from_u128(2),
            Uuid::from_u128(3),
            Uuid::from_u128(5),
        ]
    );
}

#[test]
fn resolution_preserves_the_item_source() {
    let user = Uuid::new_v4();
    let injected = Uuid::from_u128(99);
    let mut items = inbox(user, 3);
    items.push(FeedItem {
        user_id: user,
        post_id: injected,
        inserted_at: Utc::now(),
        source: "trending".to_string(),
    });

    let posts: HashMap<Uuid, Post> = items
        .iter()
        .map(|i| (i.post_id, post(i.post_id)))
        .collect();

    let resolved = resolve_items(items, &posts);
    let entry = resolved.iter().find(|e| e.post.id == injected).unwrap();
    assert_eq!(entry.source, "trending");
    assert!(resolved
        .iter()
        .filter(|e| e.post.id != injected)
        .all(|e| e.source == "follow"));
}

#[test]
fn injection_cap_closes_after_five_in_a_day() {
    let cap = 5;
    let mut accepted = 0;
    for already in 0..10 {
        if injection_allowed(already, cap) {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 5);
}
