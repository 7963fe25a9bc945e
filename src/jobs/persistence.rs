//! Deduplication & persistence gate for scraped listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::entities::jobs::{self, SOURCE_EXTERNAL, STATUS_OPEN};
use crate::scrapers::{DedupKey, ExternalJobListing};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// A listing ready to insert: id, status and timestamps already stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExternalJob {
    pub id: Uuid,
    pub listing: ExternalJobListing,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl NewExternalJob {
    pub fn from_listing(listing: ExternalJobListing) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing,
            status: STATUS_OPEN.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The store's unique index on the dedup key rejected the row.
    Duplicate,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn exists(&self, key: DedupKey<'_>) -> Result<bool, StoreError>;

    async fn insert(&self, job: NewExternalJob) -> Result<InsertOutcome, StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaveOutcome {
    pub saved: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Insert listings whose `(source_id, external_url)` is not yet stored.
///
/// Existing records are never touched. A failure on one listing is recorded
/// in `errors` and the batch continues; only an unreachable store fails the
/// whole call.
#[tracing::instrument(skip(store, listings), fields(incoming = listings.len()))]
pub async fn save_external_jobs(
    store: &dyn JobStore,
    listings: Vec<ExternalJobListing>,
) -> Result<SaveOutcome, StoreError> {
    let mut outcome = SaveOutcome::default();
    if listings.is_empty() {
        return Ok(outcome);
    }

    store.ping().await?;

    for listing in listings {
        let label = format!("{} {}", listing.source_id, listing.external_url);

        match store.exists(listing.dedup_key()).await {
            Ok(true) => {
                tracing::debug!("Skipping already stored listing: {}", label);
                outcome.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Lookup failed for {}: {}", label, e);
                outcome.errors.push(format!("lookup failed for {}: {}", label, e));
                continue;
            }
        }

        match store.insert(NewExternalJob::from_listing(listing)).await {
            Ok(InsertOutcome::Inserted) => outcome.saved += 1,
            Ok(InsertOutcome::Duplicate) => {
                tracing::warn!("Concurrent insert won for {}; counting as skipped", label);
                outcome.skipped += 1;
            }
            Err(e) => {
                tracing::error!("Insert failed for {}: {}", label, e);
                outcome.errors.push(format!("insert failed for {}: {}", label, e));
            }
        }
    }

    tracing::info!(
        "Finished saving external jobs. Saved: {}, Skipped (duplicates): {}, Errors: {}",
        outcome.saved,
        outcome.skipped,
        outcome.errors.len()
    );
    Ok(outcome)
}

/// [`JobStore`] over the sea-orm `jobs` table.
#[derive(Clone)]
pub struct SeaOrmJobStore {
    db: DatabaseConnection,
}

impl SeaOrmJobStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Newest open external jobs first.
    pub async fn list_open_external(&self, limit: u64, offset: u64) -> Result<Vec<jobs::Model>, StoreError> {
        let rows = jobs::Entity::find()
            .filter(jobs::Column::Source.eq(SOURCE_EXTERNAL))
            .filter(jobs::Column::Status.eq(STATUS_OPEN))
            .order_by_desc(jobs::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("unique constraint") || msg.contains("duplicate key value violates unique constraint")
}

#[async_trait]
impl JobStore for SeaOrmJobStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .ping()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn exists(&self, key: DedupKey<'_>) -> Result<bool, StoreError> {
        let found = jobs::Entity::find()
            .filter(jobs::Column::SourceId.eq(key.source_id))
            .filter(jobs::Column::ExternalUrl.eq(key.external_url))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, job: NewExternalJob) -> Result<InsertOutcome, StoreError> {
        let NewExternalJob { id, listing, status, created_at } = job;
        let tech_stack = serde_json::to_value(&listing.tech_stack).unwrap_or_else(|_| Json::Array(Vec::new()));

        let am = jobs::ActiveModel {
            id: Set(id),
            source: Set(SOURCE_EXTERNAL.to_string()),
            source_id: Set(Some(listing.source_id)),
            external_url: Set(Some(listing.external_url)),
            title: Set(listing.title),
            external_company: Set(listing.external_company),
            location: Set(listing.location),
            description: Set(listing.description),
            experience: Set(listing.experience),
            tech_stack: Set(tech_stack),
            status: Set(status),
            scraped_at: Set(Some(listing.scraped_at)),
            created_at: Set(created_at),
        };

        match am.insert(&self.db).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }
}
