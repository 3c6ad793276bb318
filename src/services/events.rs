//! Domain event bus

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{
    capture::{BarcodeFormat, CaptureErrorKind},
    Isbn, UpdateOutcome,
};
use crate::services::scanner::ScanState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A barcode was read from a frame
    ScanResult { isbn: Isbn, format: BarcodeFormat },
    /// A scanned barcode could not be turned into a record
    LookupFailed { isbn: Isbn, reason: String },
    InventoryUpdated { isbn: Isbn, outcome: UpdateOutcome },
    DeviceChanged { device_id: Option<String> },
    VisibilityChanged { visible: bool },
    CaptureError { kind: CaptureErrorKind, message: String },
    ScanStateChanged { state: ScanState },
    ReaderUnsupported { reason: String },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::ScanResult { .. } => "scan-result",
            SessionEvent::LookupFailed { .. } => "lookup-failed",
            SessionEvent::InventoryUpdated { .. } => "inventory-updated",
            SessionEvent::DeviceChanged { .. } => "device-changed",
            SessionEvent::VisibilityChanged { .. } => "visibility-changed",
            SessionEvent::CaptureError { .. } => "capture-error",
            SessionEvent::ScanStateChanged { .. } => "scan-state-changed",
            SessionEvent::ReaderUnsupported { .. } => "reader-unsupported",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: SessionEvent) {
        tracing::debug!("Event {}", event.name());
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
