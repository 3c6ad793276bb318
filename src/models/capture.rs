//! Capture-side types: frames, decoded barcodes, camera tracks and devices

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Symbologies a barcode reader may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Aztec,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "code_93")]
    Code93,
    Codabar,
    DataMatrix,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    Itf,
    Pdf417,
    QrCode,
    UpcA,
    UpcE,
    Unknown,
}

/// A value decoded from a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetectedBarcode {
    pub raw_value: String,
    pub format: BarcodeFormat,
}

/// One captured video frame.
///
/// Frames arrive from the capture client; when the client decodes on its
/// side, the decoded value travels with the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub decoded: Option<DetectedBarcode>,
}

impl Frame {
    pub fn new(decoded: Option<DetectedBarcode>) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            decoded,
        }
    }
}

/// Whether the reader can run in this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderSupport {
    Supported,
    Unsupported { reason: String },
}

/// Current values of the active video track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackSettings {
    #[serde(default)]
    pub torch: Option<bool>,
    #[serde(default)]
    pub zoom: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ZoomRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// What the active video track supports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackCapabilities {
    #[serde(default)]
    pub torch: bool,
    #[serde(default)]
    pub zoom: Option<ZoomRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VideoDevice {
    pub device_id: String,
    #[serde(default)]
    pub label: String,
}

/// Capture failure names as reported by media APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CaptureErrorKind {
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "NotAllowedError")]
    NotAllowed,
    #[serde(other)]
    Other,
}
