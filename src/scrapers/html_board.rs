use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name};
use serde::Deserialize;
use url::Url;

use super::http::fetch_text;
use super::{FetchError, RawListing, SiteAdapter};

/// Class names that locate a listing card and its fields on a board page.
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlSelectors {
    pub item_class: String,
    pub title_class: String,
    #[serde(default)]
    pub company_class: Option<String>,
    #[serde(default)]
    pub location_class: Option<String>,
    #[serde(default)]
    pub description_class: Option<String>,
}

/// Server-rendered job boards with one card element per posting.
pub struct HtmlBoardAdapter {
    source_id: String,
    url: String,
    selectors: HtmlSelectors,
    client: Client,
    retry_max_elapsed: Duration,
}

impl HtmlBoardAdapter {
    pub fn new(
        source_id: impl Into<String>,
        url: String,
        selectors: HtmlSelectors,
        client: Client,
        retry_max_elapsed: Duration,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            url,
            selectors,
            client,
            retry_max_elapsed,
        }
    }
}

#[async_trait]
impl SiteAdapter for HtmlBoardAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch_listings(&self) -> Result<Vec<RawListing>, FetchError> {
        let base = Url::parse(&self.url).map_err(|e| FetchError::Parse(format!("board url {}: {}", self.url, e)))?;
        let html = fetch_text(&self.client, &self.url, self.retry_max_elapsed).await?;
        parse_html_board(&html, &base, &self.selectors)
    }
}

pub fn parse_html_board(html: &str, base: &Url, selectors: &HtmlSelectors) -> Result<Vec<RawListing>, FetchError> {
    let document = Document::from(html);

    let listings: Vec<RawListing> = document
        .find(Class(selectors.item_class.as_str()))
        .map(|card| {
            let title_node = card.find(Class(selectors.title_class.as_str())).next();
            RawListing {
                url: card_link(&card, title_node.as_ref(), base),
                title: title_node.map(|n| n.text()),
                company: text_of(&card, selectors.company_class.as_deref()),
                location: text_of(&card, selectors.location_class.as_deref()),
                description: text_of(&card, selectors.description_class.as_deref()),
                experience: None,
                tags: Vec::new(),
            }
        })
        .collect();

    if listings.is_empty() {
        tracing::warn!("No `.{}` cards found; board markup may have changed", selectors.item_class);
    }

    Ok(listings)
}

fn text_of(card: &Node<'_>, class: Option<&str>) -> Option<String> {
    let class = class?;
    card.find(Class(class)).next().map(|n| n.text())
}

// Prefer the title's own anchor, then any anchor in the card.
fn card_link<'a>(card: &Node<'a>, title: Option<&Node<'a>>, base: &Url) -> Option<String> {
    let href = title
        .and_then(|t| t.attr("href").or_else(|| t.find(Name("a")).next().and_then(|a| a.attr("href"))))
        .or_else(|| card.attr("href"))
        .or_else(|| card.find(Name("a")).find_map(|a| a.attr("href")))?;

    match base.join(href.trim()) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            tracing::debug!("Unresolvable href {:?}: {}", href, e);
            None
        }
    }
}
