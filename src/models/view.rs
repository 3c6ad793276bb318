//! Presentation state of a scanning session
//!
//! Tracks which controls the capture client should show. Handlers in
//! [`crate::services::session`] are the only writers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ZOOM_STEP: f64 = 0.5;
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 10.0;

pub const CAMERA_PERMISSION_DENIED: &str = "Error accessing camera. Permission to use webcam was denied \
     or video autoplay is disabled. Reload the page to give appropriate permissions to webcam.";
pub const READER_UNSUPPORTED: &str = "Barcode detection is not supported on this device.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertVariant {
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub variant: AlertVariant,
    pub message: String,
    /// Cannot be dismissed for the rest of the session
    pub persistent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ZoomControl {
    pub min: f64,
    pub max: f64,
    pub current: f64,
    /// `current` with one decimal, as displayed
    pub label: String,
}

impl ZoomControl {
    pub fn new(min: f64, max: f64, current: f64) -> Self {
        Self {
            min,
            max,
            current,
            label: format!("{:.1}", current),
        }
    }

    pub fn zoom_in(&mut self) {
        if self.current < self.max {
            self.current += ZOOM_STEP;
        }
        self.label = format!("{:.1}", self.current);
    }

    pub fn zoom_out(&mut self) {
        if self.current > self.min {
            self.current -= ZOOM_STEP;
        }
        self.label = format!("{:.1}", self.current);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZoomAction {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CameraOption {
    pub device_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ViewState {
    pub global_actions_visible: bool,
    pub scan_button_visible: bool,
    pub scan_frame_visible: bool,
    pub scan_instructions_visible: bool,
    /// Capture actions overlay (torch, zoom, camera select)
    pub actions_visible: bool,
    pub torch_button_visible: bool,
    pub torch_on: bool,
    pub zoom: Option<ZoomControl>,
    pub cameras: Vec<CameraOption>,
    pub camera_select_visible: bool,
    pub selected_camera: Option<String>,
    pub alert: Option<Alert>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            global_actions_visible: true,
            scan_button_visible: false,
            scan_frame_visible: false,
            scan_instructions_visible: false,
            actions_visible: true,
            torch_button_visible: false,
            torch_on: false,
            zoom: None,
            cameras: Vec::new(),
            camera_select_visible: false,
            selected_camera: None,
            alert: None,
        }
    }
}

impl ViewState {
    /// Layout after a single-shot match: offer the scan button again
    pub fn show_scan_button(&mut self) {
        self.scan_button_visible = true;
        self.scan_frame_visible = false;
        self.actions_visible = false;
    }

    /// Layout while actively scanning
    pub fn show_scan_frame(&mut self) {
        self.scan_button_visible = false;
        self.scan_frame_visible = true;
        self.actions_visible = true;
    }

    pub fn is_scanning_layout(&self) -> bool {
        !self.scan_button_visible
    }
}

/// Options for a device list, falling back to `Camera N` for unlabeled devices
pub fn camera_options(devices: &[super::capture::VideoDevice]) -> Vec<CameraOption> {
    devices
        .iter()
        .enumerate()
        .map(|(index, device)| CameraOption {
            device_id: device.device_id.clone(),
            label: if device.label.is_empty() {
                format!("Camera {}", index + 1)
            } else {
                device.label.clone()
            },
        })
        .collect()
}
