/// Feed delivery endpoint
use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::FeedSource;
use crate::services::feed;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub source: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

fn caller_id(req: &HttpRequest) -> Result<Uuid> {
    req.headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::Unauthorized("missing or invalid X-User-Id header".to_string()))
}

/// GET /feed?page=&limit=&source=
#[get("/feed")]
pub async fn get_feed(
    req: HttpRequest,
    query: web::Query<FeedQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&req)?;

    let source = match query.source.as_deref() {
        Some(s) => Some(
            FeedSource::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown feed source: {s}")))?,
        ),
        None => None,
    };

    debug!(
        user_id = %user_id,
        page = query.page,
        limit = query.limit,
        source = ?source,
        "serving feed"
    );

    let page = feed::get_user_feed(&state.pool, user_id, query.page, query.limit, source).await?;
    Ok(HttpResponse::Ok().json(page))
}
