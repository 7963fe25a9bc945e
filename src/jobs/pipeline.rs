use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::aggregator::{Aggregator, ScrapeRunSummary};
use super::persistence::{save_external_jobs, JobStore, SaveOutcome, StoreError};

/// Combined outcome of one scrape + save pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PipelineReport {
    pub success: bool,
    pub jobs_found: usize,
    pub summary: ScrapeRunSummary,
    pub save: SaveOutcome,
}

/// Aggregator followed by the persistence gate. Shared by the HTTP triggers
/// and the worker binary.
pub struct ScrapePipeline {
    aggregator: Aggregator,
    store: Arc<dyn JobStore>,
}

impl ScrapePipeline {
    pub fn new(aggregator: Aggregator, store: Arc<dyn JobStore>) -> Self {
        Self { aggregator, store }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Scrape every source, then persist what came back. Per-source and
    /// per-listing failures are reported in the result; only a store that
    /// cannot be reached at all is an `Err`.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<PipelineReport, StoreError> {
        let scrape = self.aggregator.scrape_all_sites().await;
        tracing::info!(
            "Scrape finished: {} job(s) from {}/{} source(s)",
            scrape.total_jobs,
            scrape.summary.succeeded,
            scrape.summary.attempted
        );

        let save = save_external_jobs(self.store.as_ref(), scrape.jobs).await?;

        Ok(PipelineReport {
            success: scrape.success,
            jobs_found: scrape.total_jobs,
            summary: scrape.summary,
            save,
        })
    }
}
