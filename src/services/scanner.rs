//! Barcode scan loop
//!
//! One loop polls the capture for a frame, runs the reader over it and turns
//! hits into inventory updates. The interval is constant: no backoff, no
//! iteration cap. In single-shot mode the loop halts after the first match.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify, RwLock};
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::{
    capture::{BarcodeReader, VideoCapture},
    models::{parse_book, Inventory, Isbn, UpdateOutcome},
    services::{catalog::LookupOutcome, events::SessionEvent, Services},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
    MatchFound,
    Stopped,
}

/// Result of one scan tick
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Detected { isbn: Isbn, update: UpdateOutcome },
    NoDetection,
    LookupFailed { isbn: Isbn, reason: String },
    Error(String),
}

/// Why [`Scanner::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Single-shot match
    Matched,
    Stopped,
}

pub struct Scanner {
    reader: Arc<dyn BarcodeReader>,
    capture: Arc<dyn VideoCapture>,
    services: Services,
    inventory: Arc<RwLock<Inventory>>,
    sync_on_scan: bool,
    enabled: AtomicBool,
    /// Held by the one loop allowed to run
    running: AtomicBool,
    /// A start was asked for while a loop still held `running`
    restart: AtomicBool,
    state: watch::Sender<ScanState>,
    wake: Notify,
    last_detection: Mutex<Option<(String, Instant)>>,
}

impl Scanner {
    pub fn new(
        reader: Arc<dyn BarcodeReader>,
        capture: Arc<dyn VideoCapture>,
        services: Services,
        inventory: Arc<RwLock<Inventory>>,
        sync_on_scan: bool,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            reader,
            capture,
            services,
            inventory,
            sync_on_scan,
            enabled: AtomicBool::new(true),
            running: AtomicBool::new(false),
            restart: AtomicBool::new(false),
            state,
            wake: Notify::new(),
            last_detection: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Disable scanning and cut short a pending wait. No tick starts after
    /// this returns.
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.restart.store(false, Ordering::SeqCst);
        self.wake.notify_waiters();
        self.set_state(ScanState::Stopped);
    }

    /// Claim the loop. Returns false when a loop is already running; that
    /// loop serves the request if it was on its way out.
    pub fn try_start(&self) -> bool {
        self.restart.store(true, Ordering::SeqCst);
        if self.claim() {
            self.restart.store(false, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    fn claim(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give up the loop after a stop. Returns true when the caller must keep
    /// looping because scanning was re-enabled and restarted meanwhile.
    fn release(&self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        self.is_enabled() && self.restart.swap(false, Ordering::SeqCst) && self.claim()
    }

    fn set_state(&self, next: ScanState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            self.services
                .events
                .publish(SessionEvent::ScanStateChanged { state: next });
        }
    }

    /// Poll until a single-shot match or until stopped.
    pub async fn run(&self) -> RunExit {
        self.running.store(true, Ordering::SeqCst);
        loop {
            if !self.is_enabled() {
                self.set_state(ScanState::Stopped);
                if self.release() {
                    tracing::debug!("Scanning restarted while stopping");
                    continue;
                }
                return RunExit::Stopped;
            }

            self.set_state(ScanState::Scanning);
            tracing::debug!("Scanning...");
            let settings = self.services.settings.get().await;

            if let ScanOutcome::Detected { .. } = self.scan_once().await {
                self.set_state(ScanState::MatchFound);
                if !settings.continue_scanning {
                    self.set_state(ScanState::Idle);
                    self.running.store(false, Ordering::SeqCst);
                    return RunExit::Matched;
                }
            }

            // Registered before the check so a stop() in between still wakes us
            let wake = self.wake.notified();
            tokio::pin!(wake);
            wake.as_mut().enable();
            if !self.is_enabled() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(settings.interval()) => {}
                _ = wake => {}
            }
        }
    }

    /// One tick: read a frame, detect, look up, update the inventory.
    pub async fn scan_once(&self) -> ScanOutcome {
        let Some(frame) = self.capture.current_frame().await else {
            return ScanOutcome::NoDetection;
        };

        let barcode = match self.reader.detect(&frame).await {
            Ok(Some(barcode)) => barcode,
            Ok(None) => return ScanOutcome::NoDetection,
            Err(e) => {
                tracing::debug!("Detection failed on frame {}: {}", frame.id, e);
                return ScanOutcome::Error(e.to_string());
            }
        };

        let window = self.services.settings.get().await.dedupe_window();
        if self.is_repeat(&barcode.raw_value, window).await {
            tracing::debug!("Ignoring repeated barcode {}", barcode.raw_value);
            return ScanOutcome::NoDetection;
        }

        let isbn = Isbn::new(barcode.raw_value);
        tracing::info!("Found barcode {} ({:?})", isbn, barcode.format);
        self.services.events.publish(SessionEvent::ScanResult {
            isbn: isbn.clone(),
            format: barcode.format,
        });

        let doc = match self.services.catalog.fetch_book(&isbn).await {
            LookupOutcome::Found(doc) => doc,
            LookupOutcome::NotFound => return self.lookup_failed(isbn, "no catalog entry".to_string()),
            LookupOutcome::Failed(reason) => return self.lookup_failed(isbn, reason),
        };

        let record = match parse_book(doc) {
            Ok(record) => record,
            Err(e) => return self.lookup_failed(isbn, e.to_string()),
        };

        let update = self.inventory.write().await.update_book(record.clone());
        tracing::info!("Inventory {:?} for {} ({})", update, isbn, record.title);
        self.services.events.publish(SessionEvent::InventoryUpdated {
            isbn: isbn.clone(),
            outcome: update,
        });

        if self.sync_on_scan && update == UpdateOutcome::Inserted {
            self.services.records.add_book(&record).await;
        }

        ScanOutcome::Detected { isbn, update }
    }

    fn lookup_failed(&self, isbn: Isbn, reason: String) -> ScanOutcome {
        tracing::warn!("Could not inventory {}: {}", isbn, reason);
        self.services.events.publish(SessionEvent::LookupFailed {
            isbn: isbn.clone(),
            reason: reason.clone(),
        });
        ScanOutcome::LookupFailed { isbn, reason }
    }

    /// Same value as the previous detection, within the window. Every
    /// detection restarts the window.
    async fn is_repeat(&self, value: &str, window: Option<Duration>) -> bool {
        let now = Instant::now();
        let mut last = self.last_detection.lock().await;
        let repeat = match (window, last.as_ref()) {
            (Some(window), Some((previous, at))) => previous == value && now.duration_since(*at) < window,
            _ => false,
        };
        *last = Some((value.to_string(), now));
        repeat
    }
}
