//! Configuration management for Shelfscan

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::models::capture::BarcodeFormat;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// External book-search service
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    /// No timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Local record-storage API
#[derive(Debug, Deserialize, Clone)]
pub struct RecordsConfig {
    pub base_url: String,
    /// Post newly inventoried books to the records API after each scan
    #[serde(default)]
    pub sync_on_scan: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    pub interval_ms: u64,
    pub continue_scanning: bool,
    #[serde(default)]
    pub dedupe_window_ms: u64,
    pub formats: Vec<BarcodeFormat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SHELFSCAN_SCANNER__INTERVAL_MS=500 -> scanner.interval_ms
            .add_source(
                Environment::with_prefix("SHELFSCAN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("catalog.base_url", env::var("CATALOG_URL").ok())?
            .set_override_option("records.base_url", env::var("RECORDS_API_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openlibrary.org".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api.php/records/books".to_string(),
            sync_on_scan: false,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            continue_scanning: false,
            dedupe_window_ms: 0,
            formats: vec![
                BarcodeFormat::Ean13,
                BarcodeFormat::Ean8,
                BarcodeFormat::UpcA,
                BarcodeFormat::UpcE,
                BarcodeFormat::Code128,
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
