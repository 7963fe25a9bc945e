use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::arbeitnow::ArbeitnowAdapter;
use super::html_board::{HtmlBoardAdapter, HtmlSelectors};
use super::remote_ok::RemoteOkAdapter;
use super::rss_feed::RssFeedAdapter;
use super::SiteAdapter;

/// One entry of the sources file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    RemoteOk {
        #[serde(default)]
        url: Option<String>,
    },
    Arbeitnow {
        #[serde(default)]
        url: Option<String>,
        #[serde(default = "default_max_pages")]
        max_pages: usize,
    },
    Rss {
        url: String,
        #[serde(default)]
        default_location: Option<String>,
    },
    Html {
        url: String,
        #[serde(flatten)]
        selectors: HtmlSelectors,
    },
}

fn default_max_pages() -> usize {
    1
}

/// Sources used when no sources file is present.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            id: "remoteok".to_string(),
            kind: SourceKind::RemoteOk { url: None },
            enabled: true,
        },
        SourceConfig {
            id: "arbeitnow".to_string(),
            kind: SourceKind::Arbeitnow { url: None, max_pages: 2 },
            enabled: true,
        },
        SourceConfig {
            id: "weworkremotely".to_string(),
            kind: SourceKind::Rss {
                url: "https://weworkremotely.com/categories/remote-programming-jobs.rss".to_string(),
                default_location: Some("Remote".to_string()),
            },
            enabled: true,
        },
    ]
}

/// Read the sources file, falling back to [`default_sources`] when it does not exist.
pub fn load_sources(path: &Path) -> Result<Vec<SourceConfig>, std::io::Error> {
    if !path.exists() {
        tracing::info!("Sources file {} not found; using built-in sources", path.display());
        return Ok(default_sources());
    }
    let file = std::fs::File::open(path)?;
    let sources: Vec<SourceConfig> = serde_json::from_reader(file)?;
    Ok(sources)
}

pub fn build_adapters(
    sources: &[SourceConfig],
    client: &Client,
    retry_max_elapsed: Duration,
) -> Vec<Arc<dyn SiteAdapter>> {
    sources
        .iter()
        .filter(|source| source.enabled)
        .map(|source| -> Arc<dyn SiteAdapter> {
            let id = source.id.clone();
            let client = client.clone();
            match &source.kind {
                SourceKind::RemoteOk { url } => Arc::new(RemoteOkAdapter::new(id, url.clone(), client, retry_max_elapsed)),
                SourceKind::Arbeitnow { url, max_pages } => Arc::new(ArbeitnowAdapter::new(
                    id,
                    url.clone(),
                    *max_pages,
                    client,
                    retry_max_elapsed,
                )),
                SourceKind::Rss { url, default_location } => Arc::new(RssFeedAdapter::new(
                    id,
                    url.clone(),
                    default_location.clone(),
                    client,
                    retry_max_elapsed,
                )),
                SourceKind::Html { url, selectors } => Arc::new(HtmlBoardAdapter::new(
                    id,
                    url.clone(),
                    selectors.clone(),
                    client,
                    retry_max_elapsed,
                )),
            }
        })
        .collect()
}
