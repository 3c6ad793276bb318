//! Scanning session
//!
//! Owns the inventory, the scan loop and the view state of one capture
//! client. Each public `on_*` handler corresponds to one event the client
//! reports and returns the resulting view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    capture::{BarcodeReader, VideoCapture},
    error::{AppError, AppResult},
    models::{
        capture::{CaptureErrorKind, ReaderSupport},
        view::{
            camera_options, Alert, AlertVariant, ViewState, ZoomAction, ZoomControl,
            CAMERA_PERMISSION_DENIED, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM,
            READER_UNSUPPORTED,
        },
        BookRecord, Inventory, Isbn,
    },
    services::{
        events::SessionEvent,
        records::SyncOutcome,
        scanner::{RunExit, ScanState, Scanner},
        Services,
    },
};

pub struct Session {
    id: Uuid,
    reader: Arc<dyn BarcodeReader>,
    capture: Arc<dyn VideoCapture>,
    services: Services,
    inventory: Arc<RwLock<Inventory>>,
    scanner: Arc<Scanner>,
    view: Arc<RwLock<ViewState>>,
    reader_supported: AtomicBool,
    scan_task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        reader: Arc<dyn BarcodeReader>,
        capture: Arc<dyn VideoCapture>,
        services: Services,
        sync_on_scan: bool,
    ) -> Self {
        let inventory = Arc::new(RwLock::new(Inventory::new()));
        let scanner = Arc::new(Scanner::new(
            reader.clone(),
            capture.clone(),
            services.clone(),
            inventory.clone(),
            sync_on_scan,
        ));

        Self {
            id: Uuid::new_v4(),
            reader,
            capture,
            services,
            inventory,
            scanner,
            view: Arc::new(RwLock::new(ViewState::default())),
            reader_supported: AtomicBool::new(true),
            scan_task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn inventory(&self) -> Arc<RwLock<Inventory>> {
        self.inventory.clone()
    }

    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    pub fn is_reader_supported(&self) -> bool {
        self.reader_supported.load(Ordering::SeqCst)
    }

    pub async fn view(&self) -> ViewState {
        self.view.read().await.clone()
    }

    /// Check reader support. An unsupported reader disables scanning for the
    /// rest of the session.
    pub async fn initialize(&self) -> ReaderSupport {
        let support = self.reader.setup().await;
        match &support {
            ReaderSupport::Supported => {
                let formats = self.reader.supported_formats().await;
                tracing::info!("Barcode reader ready, formats: {:?}", formats);
            }
            ReaderSupport::Unsupported { reason } => {
                tracing::error!("Barcode reader unsupported: {}", reason);
                self.reader_supported.store(false, Ordering::SeqCst);
                self.scanner.stop();

                let mut view = self.view.write().await;
                view.global_actions_visible = false;
                view.alert = Some(Alert {
                    variant: AlertVariant::Danger,
                    message: READER_UNSUPPORTED.to_string(),
                    persistent: true,
                });
                drop(view);

                self.services.events.publish(SessionEvent::ReaderUnsupported {
                    reason: reason.clone(),
                });
            }
        }
        support
    }

    fn ensure_supported(&self) -> AppResult<()> {
        if self.is_reader_supported() {
            Ok(())
        } else {
            Err(AppError::Unsupported(READER_UNSUPPORTED.to_string()))
        }
    }

    /// Start the scan loop unless it is disabled or already running
    async fn scan(&self) {
        if !self.scanner.is_enabled() {
            return;
        }
        self.view.write().await.scan_instructions_visible = true;

        let mut task = self.scan_task.lock().await;
        if !self.scanner.try_start() {
            tracing::debug!("Scan loop already running");
            return;
        }

        let scanner = self.scanner.clone();
        let view = self.view.clone();
        *task = Some(tokio::spawn(async move {
            if scanner.run().await == RunExit::Matched {
                view.write().await.show_scan_button();
            }
        }));
    }

    /// The capture client started playing video
    pub async fn on_video_play(&self) -> AppResult<ViewState> {
        self.ensure_supported()?;
        self.view.write().await.scan_frame_visible = true;
        self.scan().await;

        let settings = self.capture.track_settings().await;
        let capabilities = self.capture.track_capabilities().await;
        let torch_on = self.capture.torch().await;
        let devices = self.capture.video_input_devices().await;

        let mut view = self.view.write().await;
        if capabilities.torch {
            view.torch_button_visible = true;
            view.torch_on = torch_on;
        }

        // A zoom level of 0 counts as no zoom
        let current_zoom = settings.zoom.filter(|v| *v != 0.0);
        if let (Some(current), Some(range)) = (current_zoom, capabilities.zoom.as_ref()) {
            let min = range.min.filter(|v| *v != 0.0).unwrap_or(DEFAULT_MIN_ZOOM);
            let max = range.max.filter(|v| *v != 0.0).unwrap_or(DEFAULT_MAX_ZOOM);
            view.zoom = Some(ZoomControl::new(min, max, current));
        }

        view.cameras = camera_options(&devices);
        view.camera_select_visible = devices.len() > 1;
        Ok(view.clone())
    }

    /// The capture client failed to open the camera
    pub async fn on_capture_error(&self, kind: CaptureErrorKind, message: String) -> ViewState {
        if kind == CaptureErrorKind::NotFound {
            tracing::debug!("Ignoring capture NotFoundError: {}", message);
            return self.view().await;
        }

        tracing::warn!("Capture error {:?}: {}", kind, message);
        let text = match kind {
            CaptureErrorKind::NotAllowed => CAMERA_PERMISSION_DENIED.to_string(),
            _ => message.clone(),
        };

        let mut view = self.view.write().await;
        view.scan_frame_visible = false;
        view.alert = Some(Alert {
            variant: AlertVariant::Danger,
            message: text,
            persistent: false,
        });
        let snapshot = view.clone();
        drop(view);

        self.services
            .events
            .publish(SessionEvent::CaptureError { kind, message });
        snapshot
    }

    /// Scan button pressed: clear the previous result and scan again
    pub async fn on_scan_button(&self) -> AppResult<ViewState> {
        self.ensure_supported()?;
        self.view.write().await.show_scan_frame();
        self.scan().await;
        Ok(self.view().await)
    }

    pub async fn on_torch_toggle(&self) -> AppResult<ViewState> {
        if !self.view.read().await.torch_button_visible {
            return Err(AppError::BadRequest("Torch is not available".to_string()));
        }
        let on = !self.capture.torch().await;
        self.capture.set_torch(on).await?;

        let torch_on = self.capture.torch().await;
        let mut view = self.view.write().await;
        view.torch_on = torch_on;
        Ok(view.clone())
    }

    pub async fn on_zoom(&self, action: ZoomAction) -> AppResult<ViewState> {
        let mut view = self.view.write().await;
        let zoom = view
            .zoom
            .as_mut()
            .ok_or_else(|| AppError::BadRequest("Zoom is not available".to_string()))?;
        match action {
            ZoomAction::In => zoom.zoom_in(),
            ZoomAction::Out => zoom.zoom_out(),
        }
        self.capture.set_zoom(zoom.current).await?;
        Ok(view.clone())
    }

    /// Restart the stream on another camera; empty id means default device
    pub async fn on_camera_selected(&self, device_id: Option<String>) -> AppResult<ViewState> {
        let device_id = device_id.filter(|id| !id.is_empty());
        self.capture.restart_stream(device_id.clone()).await?;

        let mut view = self.view.write().await;
        view.selected_camera = device_id.clone();
        let snapshot = view.clone();
        drop(view);

        self.services
            .events
            .publish(SessionEvent::DeviceChanged { device_id });
        Ok(snapshot)
    }

    /// Hidden: halt the loop and release the camera. Visible: resume both.
    pub async fn on_visibility_change(&self, visible: bool) -> AppResult<ViewState> {
        self.ensure_supported()?;
        self.services
            .events
            .publish(SessionEvent::VisibilityChanged { visible });

        if !visible {
            self.scanner.stop();
            self.capture.stop_stream().await;
            return Ok(self.view().await);
        }

        self.scanner.enable();
        let scanning_layout = self.view.read().await.is_scanning_layout();
        if !self.capture.is_loading().await && scanning_layout {
            self.scan().await;
        }

        let selected = self.view.read().await.selected_camera.clone();
        self.capture.start_stream(selected).await?;
        Ok(self.view().await)
    }

    /// `Escape` acts as the scan button while that button is shown
    pub async fn on_key(&self, key: &str) -> AppResult<ViewState> {
        if key == "Escape" && self.view.read().await.scan_button_visible {
            return self.on_scan_button().await;
        }
        Ok(self.view().await)
    }

    /// Drop a record from the inventory and from the records API
    pub async fn remove_book(&self, isbn: &Isbn) -> AppResult<(BookRecord, SyncOutcome)> {
        let record = self
            .inventory
            .write()
            .await
            .remove(isbn)
            .ok_or_else(|| AppError::NotFound(format!("No record for isbn {}", isbn)))?;

        let outcome = self.services.records.remove_book(&record).await;
        Ok((record, outcome))
    }

    /// Stop scanning and wait for the loop to exit
    pub async fn shutdown(&self) {
        self.scanner.stop();
        if let Some(task) = self.scan_task.lock().await.take() {
            let _ = task.await;
        }
        self.capture.stop_stream().await;
    }
}
