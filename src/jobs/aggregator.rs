//! Fan-out over every registered adapter, fan-in with partial-failure tolerance.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::Instrument;
use utoipa::ToSchema;

use crate::scrapers::{AdapterBatch, ExternalJobListing, FetchError, SiteAdapter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SourceError {
    pub source_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed,
}

/// How one adapter fared in a run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceReport {
    pub source_id: String,
    pub status: SourceStatus,
    pub listings: usize,
    pub rejected: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ScrapeRunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_jobs: usize,
    pub rejected_listings: usize,
    pub errors: Vec<SourceError>,
    pub sources: Vec<SourceReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScrapeResult {
    /// False only when no adapter produced a single listing.
    pub success: bool,
    pub jobs: Vec<ExternalJobListing>,
    pub total_jobs: usize,
    pub errors: Vec<SourceError>,
    pub summary: ScrapeRunSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    /// Budget for a single adapter; slower adapters are abandoned.
    pub adapter_timeout: Duration,
    /// Budget for the whole fan-out. Whatever finished by then is kept.
    pub run_deadline: Duration,
}

struct SourceOutcome {
    source_id: String,
    elapsed: Duration,
    result: Result<AdapterBatch, FetchError>,
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SiteAdapter>>,
    settings: AggregatorSettings,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SiteAdapter>>, settings: AggregatorSettings) -> Self {
        Self { adapters, settings }
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.source_id().to_string()).collect()
    }

    /// Run every adapter concurrently and settle all of them.
    ///
    /// One adapter failing, panicking or hanging never affects the others.
    /// No retries happen here; a failed source waits for the next run.
    #[tracing::instrument(skip(self), fields(sources = self.adapters.len()))]
    pub async fn scrape_all_sites(&self) -> ScrapeResult {
        let adapter_timeout = self.settings.adapter_timeout;
        let deadline = tokio::time::Instant::now() + self.settings.run_deadline;

        let mut tasks = JoinSet::new();
        // index keeps the report order stable regardless of completion order
        let mut pending: BTreeMap<usize, String> = BTreeMap::new();

        for (index, adapter) in self.adapters.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let source_id = adapter.source_id().to_string();
            pending.insert(index, source_id.clone());

            let span = tracing::info_span!("scrape_source", source_id = %source_id);
            tasks.spawn(
                async move {
                    let started = Instant::now();
                    let run = AssertUnwindSafe(adapter.scrape()).catch_unwind();
                    let result = match tokio::time::timeout(adapter_timeout, run).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(panic)) => Err(FetchError::Panicked(panic_message(panic))),
                        Err(_) => Err(FetchError::Timeout(adapter_timeout)),
                    };
                    (
                        index,
                        SourceOutcome {
                            source_id,
                            elapsed: started.elapsed(),
                            result,
                        },
                    )
                }
                .instrument(span),
            );
        }

        let mut finished: BTreeMap<usize, SourceOutcome> = BTreeMap::new();
        let mut deadline_hit = false;
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => {
                    pending.remove(&index);
                    finished.insert(index, outcome);
                }
                Ok(Some(Err(join_err))) => {
                    // tasks catch their own panics, so only cancellation lands here
                    tracing::error!("Adapter task ended abnormally: {}", join_err);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Scrape deadline of {:?} reached with {} source(s) still running",
                        self.settings.run_deadline,
                        pending.len()
                    );
                    tasks.abort_all();
                    deadline_hit = true;
                    break;
                }
            }
        }

        let run_deadline = self.settings.run_deadline;
        for (index, source_id) in pending {
            let result = if deadline_hit {
                Err(FetchError::Deadline)
            } else {
                Err(FetchError::Panicked("adapter task ended abnormally".to_string()))
            };
            finished.insert(
                index,
                SourceOutcome {
                    source_id,
                    elapsed: run_deadline,
                    result,
                },
            );
        }

        assemble(finished.into_values())
    }
}

fn assemble(outcomes: impl Iterator<Item = SourceOutcome>) -> ScrapeResult {
    let mut summary = ScrapeRunSummary::default();
    let mut jobs = Vec::new();

    for outcome in outcomes {
        summary.attempted += 1;
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        match outcome.result {
            Ok(batch) => {
                tracing::info!(
                    source_id = %outcome.source_id,
                    "Source returned {} listing(s), {} rejected",
                    batch.listings.len(),
                    batch.rejected
                );
                summary.succeeded += 1;
                summary.rejected_listings += batch.rejected;
                summary.sources.push(SourceReport {
                    source_id: outcome.source_id,
                    status: SourceStatus::Succeeded,
                    listings: batch.listings.len(),
                    rejected: batch.rejected,
                    elapsed_ms,
                    error: None,
                });
                jobs.extend(batch.listings);
            }
            Err(e) => {
                tracing::warn!(source_id = %outcome.source_id, "Source failed: {}", e);
                summary.failed += 1;
                summary.errors.push(SourceError {
                    source_id: outcome.source_id.clone(),
                    message: e.to_string(),
                });
                summary.sources.push(SourceReport {
                    source_id: outcome.source_id,
                    status: SourceStatus::Failed,
                    listings: 0,
                    rejected: 0,
                    elapsed_ms,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    summary.total_jobs = jobs.len();
    ScrapeResult {
        success: !jobs.is_empty(),
        total_jobs: jobs.len(),
        errors: summary.errors.clone(),
        jobs,
        summary,
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
