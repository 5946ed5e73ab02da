/// Admin configuration surface
///
/// Admin identity arrives resolved in the `X-Admin-Id` header; upstream
/// authentication is an external collaborator.
use actix_web::{get, post, put, web, HttpRequest, HttpResponse};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::TrendingSettingsPatch;
use crate::services::settings;

fn admin_id(req: &HttpRequest) -> Result<Uuid> {
    req.headers()
        .get("X-Admin-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::Unauthorized("missing or invalid X-Admin-Id header".to_string()))
}

/// GET /trending/settings
#[get("/trending/settings")]
pub async fn get_settings(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    admin_id(&req)?;

    let current = settings::get_settings(&state.pool, &state.settings).await?;
    Ok(HttpResponse::Ok().json(current))
}

/// PUT /trending/settings
///
/// Accepts any subset of the settings fields; rejects the whole request
/// on the first out-of-range field with no partial application.
#[put("/trending/settings")]
pub async fn update_settings(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TrendingSettingsPatch>,
) -> Result<HttpResponse> {
    let admin = admin_id(&req)?;

    let updated = settings::update_settings(&state.pool, &state.settings, &body, admin).await?;
    info!(admin = %admin, version = updated.version, "trending settings updated");

    Ok(HttpResponse::Ok().json(updated))
}

/// POST /trending/settings/reset
#[post("/trending/settings/reset")]
pub async fn reset_settings(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let admin = admin_id(&req)?;

    let restored = settings::reset_to_defaults(&state.pool, &state.settings, admin).await?;
    info!(admin = %admin, "trending settings reset to defaults");

    Ok(HttpResponse::Ok().json(restored))
}
