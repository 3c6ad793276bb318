//! Book catalog lookup service
//!
//! Talks to an Open Library compatible `search.json` endpoint. Failures are
//! returned as values so the scan loop can log them and keep going.

use async_trait::async_trait;

use crate::{
    config::CatalogConfig,
    error::AppResult,
    models::book::{CatalogDoc, CatalogSearchResponse, Isbn},
};

/// Result of a catalog lookup
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(CatalogDoc),
    NotFound,
    Failed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Look up the first catalog document matching `isbn`, with `isbn` attached.
    /// Never retries.
    async fn fetch_book(&self, isbn: &Isbn) -> LookupOutcome;
}

#[derive(Clone)]
pub struct OpenLibraryClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenLibraryClient {
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("shelfscan/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, isbn: &Isbn) -> AppResult<Option<CatalogDoc>> {
        let url = format!("{}/search.json", self.base_url);
        tracing::debug!("Catalog search: {} isbn={}", url, isbn);

        let response: CatalogSearchResponse = self
            .http
            .get(&url)
            .query(&[("isbn", isbn.as_str()), ("format", "json"), ("jscmd", "data")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .docs
            .into_iter()
            .next()
            .map(|doc| doc.with_isbn(isbn.clone())))
    }
}

#[async_trait]
impl CatalogClient for OpenLibraryClient {
    async fn fetch_book(&self, isbn: &Isbn) -> LookupOutcome {
        match self.search(isbn).await {
            Ok(Some(doc)) => {
                tracing::info!("Catalog match for {}: {}", isbn, doc.title);
                LookupOutcome::Found(doc)
            }
            Ok(None) => {
                tracing::info!("No catalog entry for {}", isbn);
                LookupOutcome::NotFound
            }
            Err(e) => {
                tracing::warn!("Catalog lookup failed for {}: {}", isbn, e);
                LookupOutcome::Failed(e.to_string())
            }
        }
    }
}
