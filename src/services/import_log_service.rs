use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::import_log::{self, Column as ImportLogColumn, Entity as ImportLog, ImportStatus},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Terminal data written into a log when its run ends.
#[derive(Debug, Clone)]
pub struct ImportLogOutcome {
    pub status: ImportStatus,
    pub total_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,
    /// JSON-serialized list of structured row errors
    pub errors: Option<String>,
}

/// Append/update store for import audit records
#[derive(Clone)]
pub struct ImportLogService {
    db: Arc<DbPool>,
}

impl ImportLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create a log in `processing` state, before any row of the upload is
    /// read.
    #[instrument(skip(self))]
    pub async fn create(&self, filename: &str) -> Result<import_log::Model, ServiceError> {
        let model = import_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            filename: Set(filename.to_string()),
            total_rows: Set(0),
            successful_rows: Set(0),
            failed_rows: Set(0),
            errors: Set(None),
            status: Set(ImportStatus::Processing),
            started_at: Set(Utc::now()),
            completed_at: Set(None),
        };

        let created = model.insert(&*self.db).await?;
        info!(log_id = %created.id, filename = %filename, "Import log created");

        Ok(created)
    }

    /// Move a log to its terminal state. A log can be finalized exactly once;
    /// it is an audit record afterwards.
    #[instrument(skip(self, outcome))]
    pub async fn finalize(
        &self,
        id: Uuid,
        outcome: ImportLogOutcome,
    ) -> Result<import_log::Model, ServiceError> {
        let existing = self.get(id).await?;
        if existing.status != ImportStatus::Processing {
            return Err(ServiceError::Conflict(format!(
                "import log {id} is already finalized"
            )));
        }

        let mut model: import_log::ActiveModel = existing.into();
        model.status = Set(outcome.status);
        model.total_rows = Set(outcome.total_rows);
        model.successful_rows = Set(outcome.successful_rows);
        model.failed_rows = Set(outcome.failed_rows);
        model.errors = Set(outcome.errors);
        model.completed_at = Set(Some(Utc::now()));

        let updated = model.update(&*self.db).await?;
        info!(log_id = %id, status = ?updated.status, "Import log finalized");

        Ok(updated)
    }

    /// List logs most-recent-start-first with offset/limit pagination.
    /// The returned total ignores the page window.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<import_log::Model>, u64), ServiceError> {
        let query = ImportLog::find().order_by_desc(ImportLogColumn::StartedAt);

        let total = query.clone().count(&*self.db).await?;
        let items = query.offset(skip).limit(limit).all(&*self.db).await?;

        Ok((items, total))
    }

    /// Get a log by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<import_log::Model, ServiceError> {
        ImportLog::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Import log with ID {id} not found")))
    }
}
