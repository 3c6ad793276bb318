//! Capture client endpoints
//!
//! The capture client reports what happens on its side (stream playing,
//! camera errors, devices, frames) and forwards control presses.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::SessionResponse;
use crate::{
    error::{AppError, AppResult},
    models::{
        capture::{
            BarcodeFormat, CaptureErrorKind, DetectedBarcode, Frame, TrackCapabilities,
            TrackSettings, VideoDevice,
        },
        view::ZoomAction,
    },
    AppState,
};

#[derive(Deserialize, ToSchema)]
pub struct PlayRequest {
    #[serde(default)]
    pub settings: TrackSettings,
    #[serde(default)]
    pub capabilities: TrackCapabilities,
    /// Device list, when the client enumerated devices before playing
    #[serde(default)]
    pub devices: Option<Vec<VideoDevice>>,
}

#[derive(Deserialize, ToSchema)]
pub struct CaptureErrorRequest {
    /// Media error name, e.g. `NotAllowedError`
    pub name: CaptureErrorKind,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DevicesRequest {
    pub devices: Vec<VideoDevice>,
}

/// A frame, with the value the client decoded from it if any
#[derive(Deserialize, ToSchema)]
pub struct FrameRequest {
    #[serde(default)]
    pub raw_value: Option<String>,
    /// Required with `raw_value`
    #[serde(default)]
    pub format: Option<BarcodeFormat>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FrameResponse {
    /// False when the frame was dropped: no stream is running, or its format
    /// is not enabled
    pub accepted: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct ZoomRequest {
    pub action: ZoomAction,
}

#[derive(Deserialize, ToSchema)]
pub struct CameraRequest {
    /// Empty or absent selects the default device
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Video started playing
#[utoipa::path(
    post,
    path = "/capture/play",
    tag = "capture",
    request_body = PlayRequest,
    responses(
        (status = 200, description = "Scanning started", body = SessionResponse),
        (status = 422, description = "Barcode reader unsupported")
    )
)]
pub async fn video_play(
    State(state): State<AppState>,
    Json(request): Json<PlayRequest>,
) -> AppResult<Json<SessionResponse>> {
    if let Some(devices) = request.devices {
        state.camera.report_devices(devices).await;
    }
    state
        .camera
        .report_play(request.settings, request.capabilities)
        .await;

    let view = state.session.on_video_play().await?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// Camera could not be opened
#[utoipa::path(
    post,
    path = "/capture/error",
    tag = "capture",
    request_body = CaptureErrorRequest,
    responses(
        (status = 200, description = "Error applied to the view", body = SessionResponse)
    )
)]
pub async fn capture_error(
    State(state): State<AppState>,
    Json(request): Json<CaptureErrorRequest>,
) -> Json<SessionResponse> {
    let view = state
        .session
        .on_capture_error(request.name, request.message)
        .await;
    Json(SessionResponse::new(&state, view))
}

/// Replace the list of video input devices
#[utoipa::path(
    post,
    path = "/capture/devices",
    tag = "capture",
    request_body = DevicesRequest,
    responses(
        (status = 204, description = "Devices stored")
    )
)]
pub async fn report_devices(
    State(state): State<AppState>,
    Json(request): Json<DevicesRequest>,
) -> StatusCode {
    state.camera.report_devices(request.devices).await;
    StatusCode::NO_CONTENT
}

/// Submit a frame for the next scan tick
#[utoipa::path(
    post,
    path = "/capture/frames",
    tag = "capture",
    request_body = FrameRequest,
    responses(
        (status = 202, description = "Frame queued or dropped", body = FrameResponse),
        (status = 400, description = "Decoded value without a format")
    )
)]
pub async fn push_frame(
    State(state): State<AppState>,
    Json(request): Json<FrameRequest>,
) -> AppResult<(StatusCode, Json<FrameResponse>)> {
    let decoded = match (request.raw_value, request.format) {
        (Some(raw_value), Some(format)) => Some(DetectedBarcode { raw_value, format }),
        (Some(_), None) => {
            return Err(AppError::BadRequest(
                "format is required with raw_value".to_string(),
            ))
        }
        (None, _) => None,
    };

    if let Some(barcode) = &decoded {
        if !state.config.scanner.formats.contains(&barcode.format) {
            tracing::debug!("Dropping {:?} frame: format not enabled", barcode.format);
            return Ok((StatusCode::ACCEPTED, Json(FrameResponse { accepted: false })));
        }
    }

    let accepted = state.camera.push_frame(Frame::new(decoded)).await;
    Ok((StatusCode::ACCEPTED, Json(FrameResponse { accepted })))
}

/// Toggle the torch
#[utoipa::path(
    post,
    path = "/capture/torch",
    tag = "capture",
    responses(
        (status = 200, description = "Torch toggled", body = SessionResponse),
        (status = 400, description = "Torch not available")
    )
)]
pub async fn toggle_torch(State(state): State<AppState>) -> AppResult<Json<SessionResponse>> {
    let view = state.session.on_torch_toggle().await?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// Step the zoom in or out
#[utoipa::path(
    post,
    path = "/capture/zoom",
    tag = "capture",
    request_body = ZoomRequest,
    responses(
        (status = 200, description = "Zoom applied", body = SessionResponse),
        (status = 400, description = "Zoom not available")
    )
)]
pub async fn zoom(
    State(state): State<AppState>,
    Json(request): Json<ZoomRequest>,
) -> AppResult<Json<SessionResponse>> {
    let view = state.session.on_zoom(request.action).await?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// Switch to another camera
#[utoipa::path(
    post,
    path = "/capture/camera",
    tag = "capture",
    request_body = CameraRequest,
    responses(
        (status = 200, description = "Stream restarted", body = SessionResponse),
        (status = 409, description = "Unknown device")
    )
)]
pub async fn select_camera(
    State(state): State<AppState>,
    Json(request): Json<CameraRequest>,
) -> AppResult<Json<SessionResponse>> {
    let view = state.session.on_camera_selected(request.device_id).await?;
    Ok(Json(SessionResponse::new(&state, view)))
}
