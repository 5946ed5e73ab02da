/// Engagement ingestion endpoints
use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::AppState;
use crate::db::{engagement_repo, post_repo};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::EngagementKind;
use crate::services::fanout;

#[derive(Debug, Deserialize)]
pub struct RecordEventRequest {
    pub post_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub weight: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// POST /events
///
/// Ingest one engagement event. Events are best-effort counters, not a
/// ledger: duplicate submissions are not deduplicated here.
#[post("/events")]
pub async fn record_event(
    state: web::Data<AppState>,
    body: web::Json<RecordEventRequest>,
) -> Result<HttpResponse> {
    let post_id = body
        .post_id
        .ok_or_else(|| AppError::Validation("post_id is required".to_string()))?;

    let kind_str = body
        .kind
        .as_deref()
        .ok_or_else(|| AppError::Validation("type is required".to_string()))?;
    let kind = EngagementKind::parse(kind_str)
        .ok_or_else(|| AppError::Validation(format!("unknown event type: {kind_str}")))?;

    let weight = body.weight.unwrap_or(1);
    if weight < 1 {
        return Err(AppError::Validation(format!(
            "weight must be at least 1, got {weight}"
        )));
    }

    if post_repo::find_by_id(&state.pool, post_id).await?.is_none() {
        return Err(AppError::NotFound(format!("post {post_id}")));
    }

    let timestamp = body.timestamp.unwrap_or_else(Utc::now);
    engagement_repo::record_event(&state.pool, post_id, kind, weight, timestamp).await?;
    metrics::record_event_ingested(kind.as_str());

    debug!(post_id = %post_id, kind = %kind, weight, "engagement event recorded");

    Ok(HttpResponse::Accepted().json(serde_json::json!({ "recorded": true })))
}

#[derive(Debug, Deserialize)]
pub struct PublishFanoutRequest {
    pub post_id: Uuid,
}

/// POST /internal/posts/published
///
/// Called by the content subsystem when a post goes live; fans the post
/// out into followers' feed inboxes. Best-effort per follower.
#[post("/internal/posts/published")]
pub async fn publish_fanout(
    state: web::Data<AppState>,
    body: web::Json<PublishFanoutRequest>,
) -> Result<HttpResponse> {
    let post = post_repo::find_by_id(&state.pool, body.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", body.post_id)))?;

    if !post.published {
        return Err(AppError::Validation(format!(
            "post {} is not published",
            post.id
        )));
    }

    let followers = state.graph.followers_of(post.author_id).await?;
    let summary = fanout::on_post_published(
        &state.pool,
        post.id,
        &followers,
        state.engine.feed_retention,
        Utc::now(),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "delivered": summary.delivered,
        "failed": summary.failed,
    })))
}
