// Core services
pub mod import_export_service;
pub mod import_log_service;
pub mod product_service;

pub use import_export_service::ImportExportService;
pub use import_log_service::ImportLogService;
pub use product_service::ProductService;
