//! Capture backed by a remote client
//!
//! The client owns the physical camera. It reports devices, track
//! capabilities and frames over the API; this side keeps the latest state
//! and hands frames to the scan loop.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BarcodeReader, VideoCapture};
use crate::{
    error::{AppError, AppResult},
    models::capture::{
        BarcodeFormat, DetectedBarcode, Frame, ReaderSupport, TrackCapabilities, TrackSettings,
        VideoDevice,
    },
};

#[derive(Debug, Default)]
struct CameraState {
    streaming: bool,
    loading: bool,
    active_device: Option<String>,
    devices: Vec<VideoDevice>,
    settings: TrackSettings,
    capabilities: TrackCapabilities,
    torch: bool,
    latest_frame: Option<Frame>,
}

#[derive(Debug, Default)]
pub struct RemoteCamera {
    state: RwLock<CameraState>,
}

impl RemoteCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known device list
    pub async fn report_devices(&self, devices: Vec<VideoDevice>) {
        tracing::debug!("Capture client reported {} video devices", devices.len());
        self.state.write().await.devices = devices;
    }

    /// The client started playing a stream with these track properties
    pub async fn report_play(&self, settings: TrackSettings, capabilities: TrackCapabilities) {
        let mut state = self.state.write().await;
        state.streaming = true;
        state.loading = false;
        state.torch = settings.torch.unwrap_or(false);
        state.settings = settings;
        state.capabilities = capabilities;
    }

    /// Store a frame for the next scan tick. Returns false when no stream
    /// is running and the frame was dropped.
    pub async fn push_frame(&self, frame: Frame) -> bool {
        let mut state = self.state.write().await;
        if !state.streaming {
            tracing::debug!("Dropping frame {}: stream is not running", frame.id);
            return false;
        }
        state.latest_frame = Some(frame);
        true
    }

    pub async fn active_device(&self) -> Option<String> {
        self.state.read().await.active_device.clone()
    }

    pub async fn is_streaming(&self) -> bool {
        self.state.read().await.streaming
    }
}

#[async_trait]
impl VideoCapture for RemoteCamera {
    async fn start_stream(&self, device_id: Option<String>) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(ref id) = device_id {
            if !state.devices.is_empty() && !state.devices.iter().any(|d| &d.device_id == id) {
                return Err(AppError::Capture(format!("Unknown video device {}", id)));
            }
        }
        let fallback = state.devices.first().map(|d| d.device_id.clone());
        state.active_device = device_id.or(fallback);
        state.streaming = true;
        state.loading = true;
        tracing::info!("Video stream requested on device {:?}", state.active_device);
        Ok(())
    }

    async fn stop_stream(&self) {
        let mut state = self.state.write().await;
        state.streaming = false;
        state.loading = false;
        state.latest_frame = None;
        tracing::info!("Video stream stopped");
    }

    async fn restart_stream(&self, device_id: Option<String>) -> AppResult<()> {
        self.stop_stream().await;
        self.start_stream(device_id).await
    }

    async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    async fn track_settings(&self) -> TrackSettings {
        self.state.read().await.settings.clone()
    }

    async fn track_capabilities(&self) -> TrackCapabilities {
        self.state.read().await.capabilities.clone()
    }

    async fn torch(&self) -> bool {
        self.state.read().await.torch
    }

    async fn set_torch(&self, on: bool) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.capabilities.torch {
            return Err(AppError::Capture("Active track does not support torch".to_string()));
        }
        state.torch = on;
        state.settings.torch = Some(on);
        Ok(())
    }

    async fn set_zoom(&self, level: f64) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.capabilities.zoom.is_none() {
            return Err(AppError::Capture("Active track does not support zoom".to_string()));
        }
        state.settings.zoom = Some(level);
        Ok(())
    }

    async fn video_input_devices(&self) -> Vec<VideoDevice> {
        self.state.read().await.devices.clone()
    }

    async fn current_frame(&self) -> Option<Frame> {
        let mut state = self.state.write().await;
        if !state.streaming {
            return None;
        }
        state.latest_frame.take()
    }
}

/// Reader for frames the client already decoded
#[derive(Debug, Clone)]
pub struct ClientDecodedReader {
    formats: Vec<BarcodeFormat>,
}

impl ClientDecodedReader {
    pub fn new(formats: Vec<BarcodeFormat>) -> Self {
        Self { formats }
    }
}

#[async_trait]
impl BarcodeReader for ClientDecodedReader {
    async fn setup(&self) -> ReaderSupport {
        if self.formats.is_empty() {
            ReaderSupport::Unsupported {
                reason: "no barcode formats configured".to_string(),
            }
        } else {
            ReaderSupport::Supported
        }
    }

    async fn supported_formats(&self) -> Vec<BarcodeFormat> {
        self.formats.clone()
    }

    async fn detect(&self, frame: &Frame) -> AppResult<Option<DetectedBarcode>> {
        let Some(decoded) = &frame.decoded else {
            return Ok(None);
        };
        let raw_value = decoded.raw_value.trim();
        if raw_value.is_empty() {
            return Ok(None);
        }
        if !self.formats.contains(&decoded.format) {
            tracing::debug!("Ignoring {:?} barcode: format not enabled", decoded.format);
            return Ok(None);
        }
        Ok(Some(DetectedBarcode {
            raw_value: raw_value.to_string(),
            format: decoded.format,
        }))
    }
}
