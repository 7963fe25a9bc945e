use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema};

use crate::entities::jobs;

pub const DEDUP_INDEX: &str = "idx_jobs_external_dedup";

pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    // an in-memory SQLite database lives and dies with its single connection
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let backend = if database_url.starts_with("postgres") { "PostgreSQL" } else { "SQLite" };
    tracing::info!("Connecting to database: {}", backend);

    Database::connect(options).await
}

/// Unique index backing the dedup invariant. It is the only thing keeping
/// concurrent runs (cron + manual, several instances) from double-inserting.
pub fn dedup_index() -> IndexCreateStatement {
    Index::create()
        .name(DEDUP_INDEX)
        .table(jobs::Entity)
        .col(jobs::Column::SourceId)
        .col(jobs::Column::ExternalUrl)
        .unique()
        .if_not_exists()
        .to_owned()
}

/// Create the `jobs` table and dedup index if missing. Used for SQLite
/// development databases and tests; Postgres deployments run `migration/`.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend: DbBackend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(jobs::Entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;
    db.execute(backend.build(&dedup_index())).await?;
    Ok(())
}
