use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const SOURCE_EXTERNAL: &str = "external";
pub const STATUS_OPEN: &str = "open";

/// Job postings table shared with native postings. External rows carry
/// `source = "external"` and a unique `(source_id, external_url)` pair;
/// native rows leave both null.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub source: String,
    pub source_id: Option<String>,
    pub external_url: Option<String>,
    pub title: String,
    pub external_company: String,
    pub location: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub experience: Option<f64>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tech_stack: Json, // JSON array of lowercase strings
    pub status: String,
    pub scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
