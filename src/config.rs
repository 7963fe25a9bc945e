use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::jobs::AggregatorSettings;
use crate::scrapers::http::HttpSettings;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; jobintel/0.1; +https://github.com/jobintel)";

/// Runtime configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub sources_file: PathBuf,
    /// Shared secret the external scheduler sends as a bearer token.
    pub cron_secret: Option<String>,
    /// Bearer token for operator-initiated runs.
    pub admin_token: Option<String>,
    pub adapter_timeout: Duration,
    pub scrape_deadline: Duration,
    pub max_run_duration: Duration,
    pub http_timeout: Duration,
    pub retry_max_elapsed: Duration,
    pub user_agent: String,
    pub scrape_interval: Duration,
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./jobintel.sqlite?mode=rwc".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            sources_file: PathBuf::from("data/sources.json"),
            cron_secret: None,
            admin_token: None,
            adapter_timeout: Duration::from_secs(60),
            scrape_deadline: Duration::from_secs(240),
            max_run_duration: Duration::from_secs(300),
            http_timeout: Duration::from_secs(30),
            retry_max_elapsed: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scrape_interval: Duration::from_secs(360 * 60),
            rate_limit_per_minute: None,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn secs(key: &str, default: Duration) -> Duration {
    match non_empty(key).map(|v| v.parse::<u64>()) {
        Some(Ok(value)) => Duration::from_secs(value),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid {}: {}", key, e);
            default
        }
        None => default,
    }
}

/// Keep the scrape deadline below the run budget so persistence still fits.
/// A deadline at or above `max_run_duration` is cut to 80% of it.
pub fn cap_deadline(scrape_deadline: Duration, max_run_duration: Duration) -> Duration {
    if scrape_deadline < max_run_duration {
        return scrape_deadline;
    }
    let capped = max_run_duration.mul_f64(0.8);
    tracing::warn!(
        "SCRAPE_DEADLINE_SECS ({:?}) must be below MAX_RUN_DURATION_SECS ({:?}); using {:?}",
        scrape_deadline,
        max_run_duration,
        capped
    );
    capped
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Config::default();

        let mut config = Config {
            database_url: non_empty("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            sources_file: non_empty("SCRAPE_SOURCES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.sources_file),
            cron_secret: non_empty("CRON_SECRET"),
            admin_token: non_empty("ADMIN_TOKEN"),
            adapter_timeout: secs("ADAPTER_TIMEOUT_SECS", defaults.adapter_timeout),
            scrape_deadline: secs("SCRAPE_DEADLINE_SECS", defaults.scrape_deadline),
            max_run_duration: secs("MAX_RUN_DURATION_SECS", defaults.max_run_duration),
            http_timeout: secs("HTTP_TIMEOUT_SECS", defaults.http_timeout),
            retry_max_elapsed: secs("RETRY_MAX_ELAPSED_SECS", defaults.retry_max_elapsed),
            user_agent: non_empty("SCRAPER_USER_AGENT").unwrap_or(defaults.user_agent),
            scrape_interval: non_empty("SCRAPE_INTERVAL_MINUTES")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(defaults.scrape_interval),
            rate_limit_per_minute: non_empty("RATE_LIMIT_PER_MINUTE")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0),
        };

        config.scrape_deadline = cap_deadline(config.scrape_deadline, config.max_run_duration);
        config
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            adapter_timeout: self.adapter_timeout,
            run_deadline: self.scrape_deadline,
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            request_timeout: self.http_timeout,
            retry_max_elapsed: self.retry_max_elapsed,
            user_agent: self.user_agent.clone(),
        }
    }
}
