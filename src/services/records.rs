//! Client for the local record-storage API

use async_trait::async_trait;
use reqwest::Url;

use crate::{
    config::RecordsConfig,
    error::{AppError, AppResult},
    models::book::BookRecord,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Stored,
    Failed(String),
}

impl SyncOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, SyncOutcome::Stored)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordsClient: Send + Sync {
    async fn add_book(&self, record: &BookRecord) -> SyncOutcome;

    async fn remove_book(&self, record: &BookRecord) -> SyncOutcome;
}

#[derive(Clone)]
pub struct LocalRecordsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl LocalRecordsClient {
    pub fn new(config: &RecordsConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::Internal(format!("Invalid records API url {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "Records API url {} cannot take a path",
                config.base_url
            )));
        }

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url,
        })
    }

    /// Base url with `segment` appended as one percent-encoded path segment
    fn url_with(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    async fn post(&self, url: Url, record: Option<&BookRecord>) -> AppResult<reqwest::StatusCode> {
        let request = self.http.post(url);
        let request = match record {
            Some(record) => request.json(record),
            None => request,
        };
        let response = request.send().await?.error_for_status()?;
        Ok(response.status())
    }
}

#[async_trait]
impl RecordsClient for LocalRecordsClient {
    async fn add_book(&self, record: &BookRecord) -> SyncOutcome {
        match self.post(self.url_with(""), Some(record)).await {
            Ok(status) => {
                tracing::info!("Stored record {} ({})", record.isbn, status);
                SyncOutcome::Stored
            }
            Err(e) => {
                tracing::warn!("Failed to store record {}: {}", record.isbn, e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn remove_book(&self, record: &BookRecord) -> SyncOutcome {
        match self.post(self.url_with(record.isbn.as_str()), None).await {
            Ok(status) => {
                tracing::info!("Removed record {} ({})", record.isbn, status);
                SyncOutcome::Stored
            }
            Err(e) => {
                tracing::warn!("Failed to remove record {}: {}", record.isbn, e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }
}
