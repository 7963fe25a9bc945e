use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rss::Channel;

use super::http::fetch_text;
use super::{FetchError, RawListing, SiteAdapter};

/// Any RSS job feed. We Work Remotely style titles (`"Acme: Backend Engineer"`)
/// are split into company and title.
pub struct RssFeedAdapter {
    source_id: String,
    url: String,
    default_location: Option<String>,
    client: Client,
    retry_max_elapsed: Duration,
}

impl RssFeedAdapter {
    pub fn new(
        source_id: impl Into<String>,
        url: String,
        default_location: Option<String>,
        client: Client,
        retry_max_elapsed: Duration,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            url,
            default_location,
            client,
            retry_max_elapsed,
        }
    }
}

#[async_trait]
impl SiteAdapter for RssFeedAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch_listings(&self) -> Result<Vec<RawListing>, FetchError> {
        let body = fetch_text(&self.client, &self.url, self.retry_max_elapsed).await?;
        parse_rss_feed(&body, self.default_location.as_deref())
    }
}

pub fn parse_rss_feed(body: &str, default_location: Option<&str>) -> Result<Vec<RawListing>, FetchError> {
    let channel = Channel::read_from(body.as_bytes()).map_err(|e| FetchError::Parse(format!("rss feed: {}", e)))?;

    let listings = channel
        .items()
        .iter()
        .map(|item| {
            let (company, title) = split_company_title(item.title().unwrap_or_default());
            RawListing {
                url: item.link().map(str::to_string),
                title: Some(title),
                company,
                location: default_location.map(str::to_string),
                description: item.description().map(str::to_string),
                experience: None,
                // categories name job areas, not technologies
                tags: Vec::new(),
            }
        })
        .collect();

    Ok(listings)
}

fn split_company_title(raw: &str) -> (Option<String>, String) {
    match raw.split_once(':') {
        Some((company, title)) if !company.trim().is_empty() && !title.trim().is_empty() => {
            (Some(company.trim().to_string()), title.trim().to_string())
        }
        _ => (None, raw.trim().to_string()),
    }
}
