//! Runtime scan settings
//!
//! Seeded from the `[scanner]` configuration section and adjustable over the
//! API; the scan loop re-reads them every tick.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use validator::Validate;

use crate::{config::ScannerConfig, error::AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ScanSettings {
    /// Keep scanning after a match instead of halting
    pub continue_scanning: bool,
    /// Delay between scan ticks
    #[validate(range(min = 50, max = 60000))]
    pub interval_ms: u64,
    /// Ignore a repeat of the previous value seen within this window (0 = off)
    #[validate(range(max = 60000))]
    pub dedupe_window_ms: u64,
}

impl ScanSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn dedupe_window(&self) -> Option<Duration> {
        (self.dedupe_window_ms > 0).then(|| Duration::from_millis(self.dedupe_window_ms))
    }
}

impl From<&ScannerConfig> for ScanSettings {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            continue_scanning: config.continue_scanning,
            interval_ms: config.interval_ms,
            dedupe_window_ms: config.dedupe_window_ms,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from(&ScannerConfig::default())
    }
}

/// Update settings request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub continue_scanning: Option<bool>,
    pub interval_ms: Option<u64>,
    pub dedupe_window_ms: Option<u64>,
}

#[derive(Clone)]
pub struct SettingsService {
    settings: Arc<RwLock<ScanSettings>>,
}

impl SettingsService {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Get current settings
    pub async fn get(&self) -> ScanSettings {
        self.settings.read().await.clone()
    }

    /// Merge and validate an update; nothing is stored if validation fails
    pub async fn update(&self, request: UpdateSettingsRequest) -> AppResult<ScanSettings> {
        let mut settings = self.settings.write().await;
        let mut merged = settings.clone();

        if let Some(continue_scanning) = request.continue_scanning {
            merged.continue_scanning = continue_scanning;
        }
        if let Some(interval_ms) = request.interval_ms {
            merged.interval_ms = interval_ms;
        }
        if let Some(dedupe_window_ms) = request.dedupe_window_ms {
            merged.dedupe_window_ms = dedupe_window_ms;
        }

        merged.validate()?;
        tracing::info!("Scan settings updated: {:?}", merged);
        *settings = merged.clone();
        Ok(merged)
    }
}
