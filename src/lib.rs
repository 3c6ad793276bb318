//! Shelfscan barcode inventory service
//!
//! Runs the scan loop for a remote capture client, looks scanned ISBNs up in
//! an Open Library compatible catalog and keeps an in-memory inventory that
//! can be exported or pushed to a local records API.

use std::sync::Arc;

pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use capture::{ClientDecodedReader, RemoteCamera};
use services::{session::Session, Services};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<Session>,
    pub camera: Arc<RemoteCamera>,
}

impl AppState {
    /// Wire a session around a client-fed camera and reader
    pub fn new(config: AppConfig, services: Services) -> Self {
        let camera = Arc::new(RemoteCamera::new());
        let reader = Arc::new(ClientDecodedReader::new(config.scanner.formats.clone()));
        let session = Session::new(reader, camera.clone(), services, config.records.sync_on_scan);

        Self {
            config: Arc::new(config),
            session: Arc::new(session),
            camera,
        }
    }
}
