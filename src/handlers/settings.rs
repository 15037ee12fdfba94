// src/handlers/settings.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::{error::AppError, json::AppJson},
    config::AppState,
    models::settings::PlatformSettings,
};

// GET /api/platform/config
#[utoipa::path(
    get,
    path = "/api/platform/config",
    tag = "Settings",
    responses((status = 200, description = "Configuração atual da plataforma", body = PlatformSettings)),
    security(("session_cookie" = []))
)]
pub async fn get_settings(State(app_state): State<AppState>) -> Json<PlatformSettings> {
    let current = app_state.platform.current().await;
    Json(PlatformSettings::clone(&current))
}

// PUT /api/platform/config
#[utoipa::path(
    put,
    path = "/api/platform/config",
    tag = "Settings",
    request_body = PlatformSettings,
    responses(
        (status = 200, description = "Configuração substituída", body = PlatformSettings),
        (status = 400, description = "Configuração inválida")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<PlatformSettings>,
) -> Result<Json<PlatformSettings>, AppError> {
    payload.validate()?;

    let updated = app_state.platform.replace(payload).await?;
    Ok(Json(PlatformSettings::clone(&updated)))
}
