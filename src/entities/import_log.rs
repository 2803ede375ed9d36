use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enum representing the lifecycle of an import run. A log is created in
/// `Processing` and moves exactly once to one of the terminal states.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Audit record of one import run. Row-level errors are kept as a JSON
/// document in `errors`; the log never references the product rows it
/// created.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Name of the uploaded source file
    pub filename: String,

    pub total_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,

    /// JSON-serialized list of structured row errors
    #[sea_orm(column_type = "Text", nullable)]
    pub errors: Option<String>,

    pub status: ImportStatus,

    /// Set when the log is created, before any row is read
    pub started_at: DateTime<Utc>,

    /// Set exactly once, when the run reaches a terminal state
    #[sea_orm(nullable)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
