//! API handlers for Shelfscan REST endpoints

pub mod capture;
pub mod events;
pub mod health;
pub mod inventory;
pub mod openapi;
pub mod session;
pub mod settings;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // The capture client is usually served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Session
        .route("/session", get(session::get_session))
        .route("/session/scan", post(session::start_scan))
        .route("/session/visibility", post(session::change_visibility))
        .route("/session/keys", post(session::press_key))
        // Capture client reports
        .route("/capture/play", post(capture::video_play))
        .route("/capture/error", post(capture::capture_error))
        .route("/capture/devices", post(capture::report_devices))
        .route("/capture/frames", post(capture::push_frame))
        .route("/capture/torch", post(capture::toggle_torch))
        .route("/capture/zoom", post(capture::zoom))
        .route("/capture/camera", post(capture::select_camera))
        // Inventory
        .route("/inventory", get(inventory::list_records))
        .route("/inventory/export", get(inventory::export_records))
        .route(
            "/inventory/:isbn",
            get(inventory::get_record).delete(inventory::remove_record),
        )
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Events
        .route("/events", get(events::stream_events))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
