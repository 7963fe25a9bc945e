use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod scrapers;

use config::Config;
use jobs::{Aggregator, JobStore, ScrapePipeline, SeaOrmJobStore};
use routes::TriggerAuth;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScrapePipeline>,
    pub store: SeaOrmJobStore,
    pub auth: Arc<TriggerAuth>,
}

impl AppState {
    pub fn new(pipeline: ScrapePipeline, store: SeaOrmJobStore, auth: TriggerAuth) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            store,
            auth: Arc::new(auth),
        }
    }

    pub fn from_config(config: &Config, store: SeaOrmJobStore) -> anyhow::Result<Self> {
        let pipeline = build_pipeline(config, Arc::new(store.clone()))?;
        let auth = TriggerAuth {
            cron_secret: config.cron_secret.clone(),
            admin_token: config.admin_token.clone(),
        };
        Ok(Self::new(pipeline, store, auth))
    }
}

/// Wire adapters from the configured sources file to the given store.
pub fn build_pipeline(config: &Config, store: Arc<dyn JobStore>) -> anyhow::Result<ScrapePipeline> {
    let sources = scrapers::load_sources(&config.sources_file)?;
    let client = scrapers::http::build_client(&config.http_settings())?;
    let adapters = scrapers::build_adapters(&sources, &client, config.retry_max_elapsed);
    tracing::info!("Registered {} scrape source(s)", adapters.len());

    let aggregator = Aggregator::new(adapters, config.aggregator_settings());
    Ok(ScrapePipeline::new(aggregator, store))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "JOBINTEL API",
        version = "0.1.0",
        description = "Aggregates listings from external job boards into the job store"
    ),
    paths(
        health_check,
        routes::triggers::scheduled_scrape,
        routes::triggers::on_demand_scrape,
        routes::external_jobs::list_external_jobs
    ),
    components(schemas(
        routes::ScheduledRunResponse,
        routes::ScheduledSummary,
        routes::OnDemandRunResponse,
        routes::ExternalJobsResponse,
        routes::ExternalJob,
        jobs::ScrapeRunSummary,
        jobs::SourceError,
        jobs::aggregator::SourceReport,
        jobs::aggregator::SourceStatus
    ))
)]
struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState, config: &Config) -> Router {
    let trigger_routes = Router::new()
        .route("/api/cron/scrape-jobs", get(routes::scheduled_scrape))
        .route("/api/admin/scrape-jobs", post(routes::on_demand_scrape))
        .layer(TimeoutLayer::new(config.max_run_duration));

    let trigger_routes = match config.rate_limit_per_minute.and_then(NonZeroU32::new) {
        Some(per_minute) => {
            let period = Duration::from_secs(60) / per_minute.get();
            match GovernorConfigBuilder::default()
                .key_extractor(SmartIpKeyExtractor)
                .period(period)
                .burst_size(per_minute.get())
                .finish()
            {
                Some(governor_conf) => trigger_routes.layer(GovernorLayer {
                    config: Arc::new(governor_conf),
                }),
                None => {
                    tracing::warn!("Invalid rate limit of {} per minute; trigger routes are not rate limited", per_minute);
                    trigger_routes
                }
            }
        }
        None => trigger_routes,
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/external-jobs", get(routes::list_external_jobs))
        .merge(trigger_routes);

    let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(api_routes)
        .merge(docs_router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
