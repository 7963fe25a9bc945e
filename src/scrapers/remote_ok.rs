use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::http::fetch_text;
use super::{FetchError, RawListing, SiteAdapter};

pub const DEFAULT_URL: &str = "https://remoteok.com/api";

/// Remote OK public API: a JSON array whose first element is a legal notice,
/// followed by one object per job.
pub struct RemoteOkAdapter {
    source_id: String,
    url: String,
    client: Client,
    retry_max_elapsed: Duration,
}

#[derive(Deserialize, Debug)]
struct RemoteOkJob {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    apply_url: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl RemoteOkAdapter {
    pub fn new(source_id: impl Into<String>, url: Option<String>, client: Client, retry_max_elapsed: Duration) -> Self {
        Self {
            source_id: source_id.into(),
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            client,
            retry_max_elapsed,
        }
    }
}

#[async_trait]
impl SiteAdapter for RemoteOkAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch_listings(&self) -> Result<Vec<RawListing>, FetchError> {
        let body = fetch_text(&self.client, &self.url, self.retry_max_elapsed).await?;
        parse_remote_ok(&body)
    }
}

pub fn parse_remote_ok(body: &str) -> Result<Vec<RawListing>, FetchError> {
    let entries: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("remote ok payload is not a JSON array: {}", e)))?;

    let listings = entries
        .into_iter()
        // the legal notice carries no id
        .filter(|entry| entry.get("id").is_some())
        .map(|entry| match serde_json::from_value::<RemoteOkJob>(entry) {
            Ok(job) => RawListing {
                url: job.url.or(job.apply_url),
                title: job.position,
                company: job.company,
                location: job.location,
                description: job.description,
                experience: None,
                tags: job.tags,
            },
            Err(e) => {
                // counted as rejected by the validation boundary
                tracing::warn!("Malformed remote ok entry: {}", e);
                RawListing::default()
            }
        })
        .collect();

    Ok(listings)
}
