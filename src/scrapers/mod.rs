//! Site adapters: one per external job board, all behind [`SiteAdapter`].
//!
//! Adapters return loosely-shaped [`RawListing`]s; [`SiteAdapter::scrape`]
//! pushes them through the validation boundary so only well-formed
//! [`ExternalJobListing`]s ever leave an adapter.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod arbeitnow;
pub mod html_board;
pub mod http;
pub mod normalize;
pub mod registry;
pub mod remote_ok;
pub mod rss_feed;

pub use registry::{build_adapters, load_sources, SourceConfig, SourceKind};

/// Canonical listing produced by an adapter run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExternalJobListing {
    pub source_id: String,
    pub external_url: String,
    pub title: String,
    pub external_company: String,
    pub location: String,
    pub description: String,
    pub experience: Option<f64>,
    pub tech_stack: BTreeSet<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ExternalJobListing {
    pub fn dedup_key(&self) -> DedupKey<'_> {
        DedupKey {
            source_id: &self.source_id,
            external_url: &self.external_url,
        }
    }
}

/// `(source_id, external_url)`: identifies a posting across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub source_id: &'a str,
    pub external_url: &'a str,
}

/// Whatever an adapter managed to pull out of a page or API response.
/// Nothing here is trusted until [`normalize::validate`] accepts it.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub url: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub experience: Option<f64>,
    pub tags: Vec<String>,
}

/// Validated listings from one adapter run plus the number dropped.
#[derive(Debug, Clone, Default)]
pub struct AdapterBatch {
    pub listings: Vec<ExternalJobListing>,
    pub rejected: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("adapter timed out after {0:?}")]
    Timeout(Duration),
    #[error("abandoned at run deadline")]
    Deadline,
    #[error("adapter panicked: {0}")]
    Panicked(String),
}

#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Stable identifier of the origin site, e.g. `remoteok`.
    fn source_id(&self) -> &str;

    async fn fetch_listings(&self) -> Result<Vec<RawListing>, FetchError>;

    /// Fetch and normalize. Listings that fail validation are counted in
    /// `rejected` and dropped.
    async fn scrape(&self) -> Result<AdapterBatch, FetchError> {
        let raw = self.fetch_listings().await?;
        Ok(normalize::normalize_batch(self.source_id(), raw, Utc::now()))
    }
}
