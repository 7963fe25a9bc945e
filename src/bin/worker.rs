use std::env;
use std::sync::Arc;

use jobintel::config::Config;
use jobintel::jobs::{JobStore, ScrapePipeline, SeaOrmJobStore};
use jobintel::{build_pipeline, db};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn run_once(pipeline: &ScrapePipeline) {
    match pipeline.run().await {
        Ok(report) => info!(
            success = report.success,
            "Scrape run finished. Found: {}, Saved: {}, Skipped: {}, Failed sources: {}, Save errors: {}",
            report.jobs_found,
            report.save.saved,
            report.save.skipped,
            report.summary.failed,
            report.save.errors.len()
        ),
        Err(e) => error!("Scrape run failed: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    // Command-line flags
    let args: Vec<String> = env::args().collect();
    let once = args.iter().any(|a| a == "--once");

    let conn = db::connect(&config.database_url).await?;
    if !config.database_url.starts_with("postgres") {
        db::ensure_schema(&conn).await?;
    }
    let store: Arc<dyn JobStore> = Arc::new(SeaOrmJobStore::new(conn));

    let pipeline = build_pipeline(&config, store)?;

    if once {
        run_once(&pipeline).await;
        return Ok(());
    }

    info!(
        "Worker starting; scraping {:?} every {} minutes",
        pipeline.aggregator().source_ids(),
        config.scrape_interval.as_secs() / 60
    );

    let mut ticker = interval(config.scrape_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        info!("Running scheduled scrape...");
        run_once(&pipeline).await;
    }
}
