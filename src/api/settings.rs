//! Settings endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    services::settings::{ScanSettings, UpdateSettingsRequest},
    AppState,
};

/// Get current scan settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current settings", body = ScanSettings)
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Json<ScanSettings> {
    Json(state.session.services().settings.get().await)
}

/// Update scan settings; a running scan loop picks them up on its next tick
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ScanSettings),
        (status = 400, description = "Invalid settings")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ScanSettings>> {
    let settings = state.session.services().settings.update(request).await?;
    Ok(Json(settings))
}
