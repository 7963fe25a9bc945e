use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::jobs::{PipelineReport, ScrapeRunSummary, SourceError};
use crate::AppState;

/// Shared secrets guarding the two trigger endpoints. `None` leaves the
/// endpoint open.
#[derive(Debug, Clone, Default)]
pub struct TriggerAuth {
    pub cron_secret: Option<String>,
    pub admin_token: Option<String>,
}

/// True when no secret is configured, or the header is `Bearer <secret>`.
/// The scheme name is matched case-insensitively.
pub fn bearer_matches(authorization: Option<&str>, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some((scheme, token)) = authorization.and_then(|value| value.trim().split_once(' ')) else {
        return false;
    };
    scheme.eq_ignore_ascii_case("bearer") && constant_time_eq(token.trim().as_bytes(), secret.as_bytes())
}

// Running time depends on the lengths only, never on where bytes differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<(), AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if bearer_matches(header, secret) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduledSummary {
    pub total_sources: usize,
    pub successful_sources: usize,
    pub failed_sources: usize,
    pub total_jobs: usize,
    pub rejected_listings: usize,
    pub saved: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduledRunResponse {
    pub success: bool,
    pub message: String,
    pub summary: ScheduledSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OnDemandRunResponse {
    pub success: bool,
    pub message: String,
    pub jobs_found: usize,
    pub saved: usize,
    pub skipped: usize,
    /// Sources that failed to scrape.
    pub scrape_errors: Vec<SourceError>,
    /// Listings that could not be stored.
    pub save_errors: Vec<String>,
    pub summary: ScrapeRunSummary,
}

fn run_message(report: &PipelineReport) -> String {
    if !report.success {
        return format!(
            "No jobs found: all {} source(s) failed or returned nothing",
            report.summary.attempted
        );
    }
    format!(
        "Scraped {} job(s) from {}/{} source(s); saved {} new, skipped {} existing",
        report.jobs_found,
        report.summary.succeeded,
        report.summary.attempted,
        report.save.saved,
        report.save.skipped
    )
}

/// Run the scrape pipeline on behalf of the external scheduler
#[utoipa::path(
    get,
    path = "/api/cron/scrape-jobs",
    responses(
        (status = 200, description = "Pipeline ran; `success` is false when no source returned jobs", body = ScheduledRunResponse),
        (status = 401, description = "Missing or wrong bearer token"),
        (status = 500, description = "Job store unreachable")
    ),
    description = "Scrapes every configured job board and stores listings not seen before. When CRON_SECRET is set the request must carry `Authorization: Bearer <CRON_SECRET>`."
)]
#[tracing::instrument(skip(state, headers))]
pub async fn scheduled_scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScheduledRunResponse>, AppError> {
    authorize(&headers, state.auth.cron_secret.as_deref())?;
    tracing::info!("Scheduled scrape triggered");

    let report = state.pipeline.run().await.map_err(|e| {
        tracing::error!("Scheduled scrape failed: {}", e);
        AppError::PipelineFailed(e.to_string())
    })?;

    Ok(Json(ScheduledRunResponse {
        success: report.success,
        message: run_message(&report),
        summary: ScheduledSummary {
            total_sources: report.summary.attempted,
            successful_sources: report.summary.succeeded,
            failed_sources: report.summary.failed,
            total_jobs: report.jobs_found,
            rejected_listings: report.summary.rejected_listings,
            saved: report.save.saved,
            skipped: report.save.skipped,
        },
    }))
}

/// Run the scrape pipeline on operator request
#[utoipa::path(
    post,
    path = "/api/admin/scrape-jobs",
    responses(
        (status = 200, description = "Pipeline ran, including runs that found nothing", body = OnDemandRunResponse),
        (status = 401, description = "Missing or wrong bearer token"),
        (status = 500, description = "Pipeline failed outright")
    ),
    description = "Same pipeline as the scheduled trigger with per-source and per-listing errors included. Requires `Authorization: Bearer <ADMIN_TOKEN>` when ADMIN_TOKEN is set."
)]
#[tracing::instrument(skip(state, headers))]
pub async fn on_demand_scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    authorize(&headers, state.auth.admin_token.as_deref())?;
    tracing::info!("On-demand scrape triggered");

    let report = state.pipeline.run().await.map_err(|e| {
        tracing::error!("On-demand scrape failed: {}", e);
        AppError::PipelineFailed(e.to_string())
    })?;

    let message = run_message(&report);
    let PipelineReport { success, jobs_found, summary, save } = report;

    Ok((
        StatusCode::OK,
        Json(OnDemandRunResponse {
            success,
            message,
            jobs_found,
            saved: save.saved,
            skipped: save.skipped,
            scrape_errors: summary.errors.clone(),
            save_errors: save.errors,
            summary,
        }),
    ))
}
