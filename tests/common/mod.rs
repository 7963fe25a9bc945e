#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jobintel::db;
use jobintel::jobs::persistence::{InsertOutcome, NewExternalJob};
use jobintel::jobs::{AggregatorSettings, JobStore, SeaOrmJobStore, StoreError};
use jobintel::scrapers::{DedupKey, ExternalJobListing, FetchError, RawListing, SiteAdapter};

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

pub async fn memory_store() -> SeaOrmJobStore {
    let conn = db::connect("sqlite::memory:").await.unwrap();
    db::ensure_schema(&conn).await.unwrap();
    SeaOrmJobStore::new(conn)
}

pub fn settings(adapter_timeout_ms: u64, run_deadline_ms: u64) -> AggregatorSettings {
    AggregatorSettings {
        adapter_timeout: Duration::from_millis(adapter_timeout_ms),
        run_deadline: Duration::from_millis(run_deadline_ms),
    }
}

pub fn raw(url: &str, title: &str) -> RawListing {
    RawListing {
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        company: Some("Ferris Inc".to_string()),
        location: Some("Remote".to_string()),
        description: Some("Ship Rust services.".to_string()),
        ..Default::default()
    }
}

pub fn listing(source_id: &str, url: &str, title: &str) -> ExternalJobListing {
    ExternalJobListing {
        source_id: source_id.to_string(),
        external_url: url.to_string(),
        title: title.to_string(),
        external_company: "Ferris Inc".to_string(),
        location: "Remote".to_string(),
        description: String::new(),
        experience: Some(3.0),
        tech_stack: ["rust".to_string(), "postgres".to_string()].into_iter().collect(),
        scraped_at: Utc::now(),
    }
}

pub fn listings(source_id: &str, n: usize) -> Vec<ExternalJobListing> {
    (0..n)
        .map(|i| listing(source_id, &format!("https://jobs.example/{}/{}", source_id, i), &format!("Job {}", i)))
        .collect()
}

pub enum Behaviour {
    Listings(Vec<RawListing>),
    Fail(String),
    Hang,
    Panic,
}

pub struct StubAdapter {
    id: String,
    behaviour: Behaviour,
}

impl StubAdapter {
    pub fn returning(id: &str, n: usize) -> Arc<dyn SiteAdapter> {
        let raws = (0..n)
            .map(|i| raw(&format!("https://{}.example/jobs/{}", id, i), &format!("Engineer {}", i)))
            .collect();
        Arc::new(Self { id: id.to_string(), behaviour: Behaviour::Listings(raws) })
    }

    pub fn with(id: &str, behaviour: Behaviour) -> Arc<dyn SiteAdapter> {
        Arc::new(Self { id: id.to_string(), behaviour })
    }
}

#[async_trait]
impl SiteAdapter for StubAdapter {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch_listings(&self) -> Result<Vec<RawListing>, FetchError> {
        match &self.behaviour {
            Behaviour::Listings(raws) => Ok(raws.clone()),
            Behaviour::Fail(message) => Err(FetchError::Parse(message.clone())),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Panic => panic!("adapter exploded"),
        }
    }
}

/// Delegates to a real store but fails the n-th insert (1-based).
pub struct FlakyStore {
    inner: SeaOrmJobStore,
    fail_on: usize,
    inserts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: SeaOrmJobStore, fail_on: usize) -> Self {
        Self { inner, fail_on, inserts: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn exists(&self, key: DedupKey<'_>) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }

    async fn insert(&self, job: NewExternalJob) -> Result<InsertOutcome, StoreError> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(StoreError::Unavailable("simulated write failure".to_string()));
        }
        self.inner.insert(job).await
    }
}

/// Skips the lookup so the unique index is the only guard, like two
/// overlapping runs that both saw "not stored yet".
pub struct RacingStore {
    pub inner: SeaOrmJobStore,
}

#[async_trait]
impl JobStore for RacingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn exists(&self, _key: DedupKey<'_>) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn insert(&self, job: NewExternalJob) -> Result<InsertOutcome, StoreError> {
        self.inner.insert(job).await
    }
}

/// A store that cannot be reached at all.
pub struct DownStore;

#[async_trait]
impl JobStore for DownStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn exists(&self, _key: DedupKey<'_>) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn insert(&self, _job: NewExternalJob) -> Result<InsertOutcome, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}
