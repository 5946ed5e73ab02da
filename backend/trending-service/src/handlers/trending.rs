/// Public trending list endpoint
use actix_web::{get, http::header::ContentType, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AppState;
use crate::db::post_repo;
use crate::error::Result;
use crate::models::Post;

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub items: Vec<Post>,
    pub count: usize,
    pub updated_at: DateTime<Utc>,
}

/// GET /trending
///
/// Current trending set in rank order, cached with a short TTL. The set
/// only changes once per selector cycle, so the cache is invalidated by
/// the cycle job rather than by writes.
#[get("/trending")]
pub async fn get_trending(
    query: web::Query<TrendingQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = query.limit.clamp(1, 100);

    if let Some(cached) = state.cache.get_trending(limit).await {
        return Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(cached));
    }

    let items = post_repo::trending_list(&state.pool, limit).await?;
    let response = TrendingResponse {
        count: items.len(),
        items,
        updated_at: Utc::now(),
    };

    match serde_json::to_string(&response) {
        Ok(json) => state.cache.set_trending(limit, &json).await,
        Err(e) => warn!("failed to serialize trending response for cache: {e}"),
    }

    Ok(HttpResponse::Ok().json(response))
}
