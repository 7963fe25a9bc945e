use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::jobs;
use crate::error::AppError;
use crate::AppState;

const MAX_LIMIT: u64 = 100;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExternalJobsQuery {
    /// Page size, 1 to 100. Defaults to 20.
    #[serde(default = "default_limit")]
    #[param(required = false)]
    limit: u64,
    /// Number of jobs to skip. Defaults to 0.
    #[serde(default)]
    #[param(required = false)]
    offset: u64,
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExternalJob {
    pub id: Uuid,
    pub source_id: String,
    pub external_url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub experience: Option<f64>,
    pub tech_stack: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<jobs::Model> for ExternalJob {
    fn from(model: jobs::Model) -> Self {
        let tech_stack = serde_json::from_value(model.tech_stack).unwrap_or_default();
        Self {
            id: model.id,
            source_id: model.source_id.unwrap_or_default(),
            external_url: model.external_url.unwrap_or_default(),
            title: model.title,
            company: model.external_company,
            location: model.location,
            description: model.description,
            experience: model.experience,
            tech_stack,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExternalJobsResponse {
    pub jobs: Vec<ExternalJob>,
    pub limit: u64,
    pub offset: u64,
}

/// List open jobs imported from external boards, newest first
#[utoipa::path(
    get,
    path = "/api/external-jobs",
    params(ExternalJobsQuery),
    responses(
        (status = 200, description = "Page of stored external jobs", body = ExternalJobsResponse),
        (status = 400, description = "Malformed query string"),
        (status = 500, description = "Database error")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_external_jobs(
    State(state): State<AppState>,
    query: Result<Query<ExternalJobsQuery>, QueryRejection>,
) -> Result<Json<ExternalJobsResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let limit = query.limit.clamp(1, MAX_LIMIT);
    let rows = state.store.list_open_external(limit, query.offset).await?;

    Ok(Json(ExternalJobsResponse {
        jobs: rows.into_iter().map(ExternalJob::from).collect(),
        limit,
        offset: query.offset,
    }))
}
