//! The validation boundary between loosely-shaped scraped data and
//! [`ExternalJobListing`].

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::predicate::Text;
use url::Url;

use super::{AdapterBatch, ExternalJobListing, RawListing};

// Keywords recognised when a site gives us no tags of its own.
const TECH_KEYWORDS: &[&str] = &[
    "rust", "golang", "python", "java", "kotlin", "scala", "swift", "c++", "c#",
    ".net", "ruby", "rails", "php", "laravel", "elixir", "erlang", "haskell", "javascript",
    "typescript", "node", "node.js", "react", "vue", "angular", "svelte", "next.js", "django",
    "flask", "fastapi", "spring", "graphql", "postgres", "postgresql", "mysql", "sqlite",
    "mongodb", "redis", "kafka", "elasticsearch", "aws", "gcp", "azure", "docker",
    "kubernetes", "terraform", "linux", "android", "ios", "flutter", "solidity", "sql",
];

static TECH_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| TECH_KEYWORDS.iter().copied().collect());

static EXPERIENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?:\.\d)?)\s*\+?\s*(?:years?|yrs?)\b").expect("valid experience regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingUrl,
    InvalidUrl(String),
}

/// Validate every raw listing, keeping the good ones.
pub fn normalize_batch(source_id: &str, raw: Vec<RawListing>, scraped_at: DateTime<Utc>) -> AdapterBatch {
    let mut batch = AdapterBatch::default();
    for listing in raw {
        match validate(source_id, listing, scraped_at) {
            Ok(job) => batch.listings.push(job),
            Err(reason) => {
                tracing::warn!(source_id, ?reason, "rejecting scraped listing");
                batch.rejected += 1;
            }
        }
    }
    batch
}

pub fn validate(
    source_id: &str,
    raw: RawListing,
    scraped_at: DateTime<Utc>,
) -> Result<ExternalJobListing, Rejection> {
    let external_url = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(Rejection::MissingUrl)?
        .to_string();

    match Url::parse(&external_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return Err(Rejection::InvalidUrl(external_url)),
    }

    let description = raw.description.as_deref().map(html_to_text).unwrap_or_default();

    let mut tech_stack: BTreeSet<String> = raw
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tech_stack.is_empty() {
        tech_stack = extract_tech_stack(&description);
    }

    let experience = raw
        .experience
        .filter(|years| years.is_finite() && *years >= 0.0)
        .or_else(|| extract_experience_years(&description));

    Ok(ExternalJobListing {
        source_id: source_id.to_string(),
        external_url,
        title: clean(raw.title.as_deref()),
        external_company: clean(raw.company.as_deref()),
        location: clean(raw.location.as_deref()),
        description,
        experience,
        tech_stack,
        scraped_at,
    })
}

fn clean(value: Option<&str>) -> String {
    value
        .map(|v| WHITESPACE_RE.replace_all(v.trim(), " ").into_owned())
        .unwrap_or_default()
}

/// Reduce an HTML fragment to whitespace-collapsed text. Plain text passes through.
pub fn html_to_text(input: &str) -> String {
    if !input.contains('<') {
        return clean(Some(input));
    }
    let document = Document::from(input);
    let text: Vec<&str> = document
        .find(Text)
        .filter(|node| {
            !matches!(
                node.parent().and_then(|p| p.name()),
                Some("script") | Some("style")
            )
        })
        .filter_map(|node| node.as_text())
        .collect();
    clean(Some(&text.join(" ")))
}

/// First "N years"/"N+ yrs" mention in the text.
pub fn extract_experience_years(text: &str) -> Option<f64> {
    EXPERIENCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn extract_tech_stack(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|token| token.trim_end_matches('.').to_lowercase())
        .filter(|token| token.len() > 1 && TECH_SET.contains(token.as_str()))
        .collect()
}
