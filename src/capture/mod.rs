//! Capture capabilities consumed by the scan loop and the session
//!
//! `BarcodeReader` turns frames into decoded values; `VideoCapture` owns the
//! camera stream and its track controls. `remote` implements both on top of
//! state reported by the capture client.

pub mod remote;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::capture::{
        BarcodeFormat, DetectedBarcode, Frame, ReaderSupport, TrackCapabilities, TrackSettings,
        VideoDevice,
    },
};

pub use remote::{ClientDecodedReader, RemoteCamera};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarcodeReader: Send + Sync {
    /// Checked once per session; `Unsupported` is fatal to scanning
    async fn setup(&self) -> ReaderSupport;

    async fn supported_formats(&self) -> Vec<BarcodeFormat>;

    /// `Ok(None)` when the frame holds no barcode
    async fn detect(&self, frame: &Frame) -> AppResult<Option<DetectedBarcode>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoCapture: Send + Sync {
    async fn start_stream(&self, device_id: Option<String>) -> AppResult<()>;

    async fn stop_stream(&self);

    async fn restart_stream(&self, device_id: Option<String>) -> AppResult<()>;

    /// True between a stream request and the first played frame
    async fn is_loading(&self) -> bool;

    async fn track_settings(&self) -> TrackSettings;

    async fn track_capabilities(&self) -> TrackCapabilities;

    async fn torch(&self) -> bool;

    async fn set_torch(&self, on: bool) -> AppResult<()>;

    async fn set_zoom(&self, level: f64) -> AppResult<()>;

    async fn video_input_devices(&self) -> Vec<VideoDevice>;

    /// Latest frame not yet handed out, if the stream is running
    async fn current_frame(&self) -> Option<Frame>;
}
