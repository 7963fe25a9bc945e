use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Jobs::Source).string().not_null().default("native"))
                    // null for native postings
                    .col(ColumnDef::new(Jobs::SourceId).string())
                    .col(ColumnDef::new(Jobs::ExternalUrl).text())
                    .col(ColumnDef::new(Jobs::Title).string().not_null())
                    .col(ColumnDef::new(Jobs::ExternalCompany).string().not_null())
                    .col(ColumnDef::new(Jobs::Location).string().not_null())
                    .col(ColumnDef::new(Jobs::Description).text().not_null())
                    .col(ColumnDef::new(Jobs::Experience).double())
                    .col(ColumnDef::new(Jobs::TechStack).json_binary().not_null())
                    .col(ColumnDef::new(Jobs::Status).string().not_null().default("open"))
                    .col(ColumnDef::new(Jobs::ScrapedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone() // Corresponds to DateTime<Utc>
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Dedup key for scraped listings; concurrent runs rely on it.
        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_external_dedup")
                    .table(Jobs::Table)
                    .col(Jobs::SourceId)
                    .col(Jobs::ExternalUrl)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_source_status_created")
                    .table(Jobs::Table)
                    .col(Jobs::Source)
                    .col(Jobs::Status)
                    .col(Jobs::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    Source,
    SourceId,
    ExternalUrl,
    Title,
    ExternalCompany,
    Location,
    Description,
    Experience,
    TechStack,
    Status,
    ScrapedAt,
    CreatedAt,
}
