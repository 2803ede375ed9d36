pub mod auth;
pub mod common;
pub mod import_export;
pub mod products;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{ImportExportService, ImportLogService, ProductService};

/// Aggregate of the services used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub import_logs: ImportLogService,
    pub import_export: ImportExportService,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig, auth: Arc<AuthService>) -> Self {
        let products = ProductService::new(db.clone());
        let import_logs = ImportLogService::new(db);
        let import_export = ImportExportService::new(
            products.clone(),
            import_logs.clone(),
            config.import_batch_size,
        );

        Self {
            products,
            import_logs,
            import_export,
            auth,
        }
    }
}
