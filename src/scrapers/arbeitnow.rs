use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::fetch_text;
use super::{FetchError, RawListing, SiteAdapter};

pub const DEFAULT_URL: &str = "https://www.arbeitnow.com/api/job-board-api";

/// Arbeitnow job board API. Paginated through `links.next`.
pub struct ArbeitnowAdapter {
    source_id: String,
    url: String,
    max_pages: usize,
    client: Client,
    retry_max_elapsed: Duration,
}

#[derive(Deserialize, Debug)]
pub struct ArbeitnowPage {
    #[serde(default)]
    data: Vec<ArbeitnowJob>,
    #[serde(default)]
    links: Option<ArbeitnowLinks>,
}

#[derive(Deserialize, Debug)]
struct ArbeitnowLinks {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ArbeitnowJob {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    remote: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl ArbeitnowPage {
    pub fn next_page(&self) -> Option<&str> {
        self.links.as_ref().and_then(|l| l.next.as_deref())
    }

    pub fn into_listings(self) -> Vec<RawListing> {
        self.data
            .into_iter()
            .map(|job| {
                let location = match (job.location, job.remote) {
                    (Some(loc), true) if !loc.trim().is_empty() => Some(format!("{} (Remote)", loc.trim())),
                    (None, true) => Some("Remote".to_string()),
                    (loc, _) => loc,
                };
                RawListing {
                    url: job.url,
                    title: job.title,
                    company: job.company_name,
                    location,
                    description: job.description,
                    experience: None,
                    tags: job.tags,
                }
            })
            .collect()
    }
}

pub fn parse_arbeitnow_page(body: &str) -> Result<ArbeitnowPage, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Parse(format!("arbeitnow page: {}", e)))
}

impl ArbeitnowAdapter {
    pub fn new(
        source_id: impl Into<String>,
        url: Option<String>,
        max_pages: usize,
        client: Client,
        retry_max_elapsed: Duration,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            max_pages: max_pages.max(1),
            client,
            retry_max_elapsed,
        }
    }
}

#[async_trait]
impl SiteAdapter for ArbeitnowAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch_listings(&self) -> Result<Vec<RawListing>, FetchError> {
        let mut listings = Vec::new();
        let mut next = Some(self.url.clone());
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            if pages == self.max_pages {
                break;
            }
            let body = match fetch_text(&self.client, &page_url, self.retry_max_elapsed).await {
                Ok(body) => body,
                // later pages failing still leaves us with what the first ones had
                Err(e) if pages > 0 => {
                    tracing::warn!(source_id = %self.source_id, "Stopping pagination at {}: {}", page_url, e);
                    break;
                }
                Err(e) => return Err(e),
            };
            let page = parse_arbeitnow_page(&body)?;
            next = page.next_page().map(str::to_string);
            listings.extend(page.into_listings());
            pages += 1;
        }

        tracing::debug!(source_id = %self.source_id, pages, "fetched {} arbeitnow listings", listings.len());
        Ok(listings)
    }
}
