pub mod import_log;
pub mod product;

pub use import_log::ImportStatus;
