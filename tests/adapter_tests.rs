use chrono::Utc;
use jobintel::scrapers::arbeitnow::parse_arbeitnow_page;
use jobintel::scrapers::html_board::{parse_html_board, HtmlSelectors};
use jobintel::scrapers::normalize::{extract_experience_years, extract_tech_stack, html_to_text, normalize_batch};
use jobintel::scrapers::remote_ok::parse_remote_ok;
use jobintel::scrapers::rss_feed::parse_rss_feed;
use jobintel::scrapers::{build_adapters, load_sources, FetchError, SourceConfig, SourceKind};
use std::path::Path;
use std::time::Duration;
use url::Url;

const REMOTE_OK_BODY: &str = r#"[
  {"legal": "By using the Remote OK API you agree to the terms"},
  {
    "id": "123",
    "url": "https://remoteok.com/remote-jobs/123",
    "position": "Rust Developer",
    "company": "Ferris",
    "location": "Worldwide",
    "description": "<p>Build <b>fast</b> services. 4+ years required.</p>",
    "tags": ["Rust", "Backend", "rust"]
  },
  {"id": "124", "position": "Listing without a link"}
]"#;

#[test]
fn test_parse_remote_ok_skips_legal_notice() {
    let raws = parse_remote_ok(REMOTE_OK_BODY).unwrap();
    assert_eq!(raws.len(), 2);

    let batch = normalize_batch("remoteok", raws, Utc::now());
    assert_eq!(batch.listings.len(), 1);
    assert_eq!(batch.rejected, 1);

    let job = &batch.listings[0];
    assert_eq!(job.source_id, "remoteok");
    assert_eq!(job.external_url, "https://remoteok.com/remote-jobs/123");
    assert_eq!(job.title, "Rust Developer");
    assert_eq!(job.external_company, "Ferris");
    assert_eq!(job.description, "Build fast services. 4+ years required.");
    assert_eq!(job.experience, Some(4.0));
    let stack: Vec<&str> = job.tech_stack.iter().map(String::as_str).collect();
    assert_eq!(stack, vec!["backend", "rust"]);
}

#[test]
fn test_parse_remote_ok_rejects_non_array() {
    let err = parse_remote_ok(r#"{"error": "rate limited"}"#).unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn test_parse_arbeitnow_page() {
    let body = r#"{
      "data": [
        {
          "slug": "rust-engineer-berlin",
          "company_name": "Crab GmbH",
          "title": "Rust Engineer",
          "description": "<p>Tokio, Postgres and Kubernetes.</p>",
          "remote": true,
          "url": "https://www.arbeitnow.com/jobs/companies/crab/rust-engineer-berlin",
          "tags": [],
          "job_types": ["full time"],
          "location": "Berlin",
          "created_at": 1700000000
        }
      ],
      "links": {"next": "https://www.arbeitnow.com/api/job-board-api?page=2"}
    }"#;

    let page = parse_arbeitnow_page(body).unwrap();
    assert_eq!(page.next_page(), Some("https://www.arbeitnow.com/api/job-board-api?page=2"));

    let batch = normalize_batch("arbeitnow", page.into_listings(), Utc::now());
    assert_eq!(batch.listings.len(), 1);
    let job = &batch.listings[0];
    assert_eq!(job.location, "Berlin (Remote)");
    assert_eq!(job.external_company, "Crab GmbH");
    // no tags from the site, so the stack comes from the description
    assert!(job.tech_stack.contains("postgres"));
    assert!(job.tech_stack.contains("kubernetes"));
    assert_eq!(job.experience, None);
}

#[test]
fn test_parse_rss_feed_splits_company() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>We Work Remotely: Programming</title>
    <link>https://weworkremotely.com</link>
    <description>Remote programming jobs</description>
    <item>
      <title>Acme Corp: Senior Rust Engineer</title>
      <link>https://weworkremotely.com/remote-jobs/acme-corp-senior-rust-engineer</link>
      <description>&lt;p&gt;We need 5+ years of Rust and Kubernetes.&lt;/p&gt;</description>
      <category>Programming</category>
    </item>
    <item>
      <title>Listing with no link</title>
      <description>Nothing to see</description>
    </item>
  </channel>
</rss>"#;

    let raws = parse_rss_feed(body, Some("Remote")).unwrap();
    assert_eq!(raws.len(), 2);

    let batch = normalize_batch("weworkremotely", raws, Utc::now());
    assert_eq!(batch.listings.len(), 1);
    assert_eq!(batch.rejected, 1);

    let job = &batch.listings[0];
    assert_eq!(job.external_company, "Acme Corp");
    assert_eq!(job.title, "Senior Rust Engineer");
    assert_eq!(job.location, "Remote");
    assert_eq!(job.experience, Some(5.0));
    let stack: Vec<&str> = job.tech_stack.iter().map(String::as_str).collect();
    assert_eq!(stack, vec!["kubernetes", "rust"]);
}

#[test]
fn test_parse_rss_feed_rejects_garbage() {
    assert!(matches!(parse_rss_feed("not xml at all", None), Err(FetchError::Parse(_))));
}

#[test]
fn test_parse_html_board_resolves_links() {
    let html = r#"<html><body>
      <div class="job-card featured">
        <a class="job-title" href="/jobs/1">Backend Engineer</a>
        <span class="job-company">Ferris Inc</span>
        <span class="job-location">Berlin</span>
      </div>
      <div class="job-card">
        <h3 class="job-title">Platform Engineer</h3>
        <span class="job-company">Crab Co</span>
        <a href="https://other.example/apply/2">Apply</a>
      </div>
      <div class="job-card"><h3 class="job-title">No link here</h3></div>
    </body></html>"#;
    let selectors = HtmlSelectors {
        item_class: "job-card".to_string(),
        title_class: "job-title".to_string(),
        company_class: Some("job-company".to_string()),
        location_class: Some("job-location".to_string()),
        description_class: None,
    };
    let base = Url::parse("https://board.example/list").unwrap();

    let raws = parse_html_board(html, &base, &selectors).unwrap();
    assert_eq!(raws.len(), 3);
    assert_eq!(raws[0].url.as_deref(), Some("https://board.example/jobs/1"));
    assert_eq!(raws[1].url.as_deref(), Some("https://other.example/apply/2"));
    assert_eq!(raws[2].url, None);

    let batch = normalize_batch("board", raws, Utc::now());
    assert_eq!(batch.listings.len(), 2);
    assert_eq!(batch.rejected, 1);
    assert_eq!(batch.listings[0].title, "Backend Engineer");
    assert_eq!(batch.listings[0].location, "Berlin");
    assert_eq!(batch.listings[1].external_company, "Crab Co");
    assert_eq!(batch.listings[1].location, "");
}

#[test]
fn test_text_helpers() {
    assert_eq!(html_to_text("<div><p>Hello</p><p>world</p></div>"), "Hello world");
    assert_eq!(html_to_text("  plain\n  text "), "plain text");
    assert_eq!(extract_experience_years("Requires 3 yrs of Go"), Some(3.0));
    assert_eq!(extract_experience_years("No experience needed"), None);

    let stack = extract_tech_stack("We use TypeScript, React and C++. Also Node.js!");
    assert!(stack.contains("typescript"));
    assert!(stack.contains("react"));
    assert!(stack.contains("c++"));
    assert!(stack.contains("node.js"));
    assert!(!stack.contains("also"));
}

#[test]
fn test_sources_file_parsing_and_registry() {
    let json = r#"[
      {"id": "remoteok", "kind": "remote_ok"},
      {"id": "arbeitnow", "kind": "arbeitnow", "max_pages": 3},
      {"id": "wwr", "kind": "rss", "url": "https://weworkremotely.com/remote-jobs.rss"},
      {"id": "board", "kind": "html", "url": "https://board.example", "item_class": "card", "title_class": "title", "enabled": false}
    ]"#;
    let sources: Vec<SourceConfig> = serde_json::from_str(json).unwrap();
    assert_eq!(sources.len(), 4);
    assert!(matches!(sources[1].kind, SourceKind::Arbeitnow { max_pages: 3, .. }));
    assert!(matches!(&sources[3].kind, SourceKind::Html { selectors, .. } if selectors.item_class == "card"));
    assert!(!sources[3].enabled);

    let adapters = build_adapters(&sources, &reqwest::Client::new(), Duration::from_secs(1));
    let ids: Vec<&str> = adapters.iter().map(|a| a.source_id()).collect();
    assert_eq!(ids, vec!["remoteok", "arbeitnow", "wwr"]);
}

#[test]
fn test_missing_sources_file_uses_defaults() {
    let sources = load_sources(Path::new("does/not/exist/sources.json")).unwrap();
    let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["remoteok", "arbeitnow", "weworkremotely"]);
}
