pub mod aggregator;
pub mod persistence;
pub mod pipeline;

pub use aggregator::{Aggregator, AggregatorSettings, ScrapeResult, ScrapeRunSummary, SourceError};
pub use persistence::{save_external_jobs, JobStore, SaveOutcome, SeaOrmJobStore, StoreError};
pub use pipeline::{PipelineReport, ScrapePipeline};
