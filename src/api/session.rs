//! Session endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::view::ViewState,
    services::scanner::ScanState,
    AppState,
};

/// Session state as seen by the capture client
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub scan_state: ScanState,
    pub reader_supported: bool,
    pub view: ViewState,
}

impl SessionResponse {
    pub(crate) fn new(state: &AppState, view: ViewState) -> Self {
        Self {
            session_id: state.session.id(),
            scan_state: state.session.scan_state(),
            reader_supported: state.session.is_reader_supported(),
            view,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct VisibilityRequest {
    pub visible: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct KeyRequest {
    /// Key name, e.g. `Escape`
    pub key: String,
}

/// Get session state
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse)
    )
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let view = state.session.view().await;
    Json(SessionResponse::new(&state, view))
}

/// Press the scan button
#[utoipa::path(
    post,
    path = "/session/scan",
    tag = "session",
    responses(
        (status = 200, description = "Scanning started", body = SessionResponse),
        (status = 422, description = "Barcode reader unsupported")
    )
)]
pub async fn start_scan(State(state): State<AppState>) -> AppResult<Json<SessionResponse>> {
    let view = state.session.on_scan_button().await?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// Report that the client became hidden or visible
#[utoipa::path(
    post,
    path = "/session/visibility",
    tag = "session",
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility applied", body = SessionResponse)
    )
)]
pub async fn change_visibility(
    State(state): State<AppState>,
    Json(request): Json<VisibilityRequest>,
) -> AppResult<Json<SessionResponse>> {
    let view = state.session.on_visibility_change(request.visible).await?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// Report a key press
#[utoipa::path(
    post,
    path = "/session/keys",
    tag = "session",
    request_body = KeyRequest,
    responses(
        (status = 200, description = "Key handled", body = SessionResponse)
    )
)]
pub async fn press_key(
    State(state): State<AppState>,
    Json(request): Json<KeyRequest>,
) -> AppResult<Json<SessionResponse>> {
    let view = state.session.on_key(&request.key).await?;
    Ok(Json(SessionResponse::new(&state, view)))
}
