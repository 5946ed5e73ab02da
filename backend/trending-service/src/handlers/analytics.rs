/// Admin analytics endpoint
use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use super::AppState;
use crate::error::{AppError, Result};
use crate::services::analytics;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

/// GET /trending/analytics?days=N
#[get("/trending/analytics")]
pub async fn get_trending_analytics(
    query: web::Query<AnalyticsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !(1..=90).contains(&query.days) {
        return Err(AppError::Validation(format!(
            "days must be between 1 and 90, got {}",
            query.days
        )));
    }

    let summary = analytics::get_trending_analytics(&state.pool, query.days, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
