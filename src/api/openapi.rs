//! OpenAPI documentation

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::api::{capture, health, inventory, session, settings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfscan API",
        version = "0.1.0",
        description = "Barcode scanning book inventory API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Session
        session::get_session,
        session::start_scan,
        session::change_visibility,
        session::press_key,
        // Capture
        capture::video_play,
        capture::capture_error,
        capture::report_devices,
        capture::push_frame,
        capture::toggle_torch,
        capture::zoom,
        capture::select_camera,
        // Inventory
        inventory::list_records,
        inventory::get_record,
        inventory::remove_record,
        inventory::export_records,
        // Settings
        settings::get_settings,
        settings::update_settings,
    ),
    components(
        schemas(
            // Session
            session::SessionResponse,
            session::VisibilityRequest,
            session::KeyRequest,
            crate::services::scanner::ScanState,
            crate::models::view::ViewState,
            crate::models::view::Alert,
            crate::models::view::AlertVariant,
            crate::models::view::ZoomControl,
            crate::models::view::ZoomAction,
            crate::models::view::CameraOption,
            // Capture
            capture::PlayRequest,
            capture::CaptureErrorRequest,
            capture::DevicesRequest,
            capture::FrameRequest,
            capture::FrameResponse,
            capture::ZoomRequest,
            capture::CameraRequest,
            crate::models::capture::BarcodeFormat,
            crate::models::capture::CaptureErrorKind,
            crate::models::capture::TrackSettings,
            crate::models::capture::TrackCapabilities,
            crate::models::capture::ZoomRange,
            crate::models::capture::VideoDevice,
            // Inventory
            inventory::InventoryResponse,
            inventory::RemoveResponse,
            crate::models::book::BookRecord,
            crate::models::book::Isbn,
            // Settings
            crate::services::settings::ScanSettings,
            crate::services::settings::UpdateSettingsRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Scanning session state and controls"),
        (name = "capture", description = "Capture client reports"),
        (name = "inventory", description = "Scanned books"),
        (name = "settings", description = "Scan settings")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
