//! Business logic services

pub mod catalog;
pub mod events;
pub mod records;
pub mod scanner;
pub mod session;
pub mod settings;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult};

/// Container for the clients and shared state the scan path depends on
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn catalog::CatalogClient>,
    pub records: Arc<dyn records::RecordsClient>,
    pub settings: settings::SettingsService,
    pub events: events::EventBus,
}

impl Services {
    /// Create all services from configuration
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        Ok(Self::with_clients(
            Arc::new(catalog::OpenLibraryClient::new(&config.catalog)?),
            Arc::new(records::LocalRecordsClient::new(&config.records)?),
            settings::SettingsService::new(settings::ScanSettings::from(&config.scanner)),
            events::EventBus::default(),
        ))
    }

    pub fn with_clients(
        catalog: Arc<dyn catalog::CatalogClient>,
        records: Arc<dyn records::RecordsClient>,
        settings: settings::SettingsService,
        events: events::EventBus,
    ) -> Self {
        Self {
            catalog,
            records,
            settings,
            events,
        }
    }
}
