use std::collections::HashMap;
use std::io::Cursor;
use std::str::FromStr;

use crate::{
    entities::import_log::{self, ImportStatus},
    errors::ServiceError,
    services::import_log_service::{ImportLogOutcome, ImportLogService},
    services::product_service::{self, NewProduct, ProductService},
};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];
const REQUIRED_COLUMNS: [&str; 5] = ["nombre", "descripcion", "precio", "stock", "categoria"];
const EXPORT_COLUMNS: [&str; 6] = ["id", "nombre", "descripcion", "precio", "stock", "categoria"];
/// Responses carry at most this many row errors; the full list stays in the
/// log store.
const MAX_SUMMARY_ERRORS: usize = 100;

/// One rejected row, keyed by the file's visible line number (the header is
/// line 1, the first data row line 2). `field` names the offending file
/// column.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "row": 3,
    "field": "precio",
    "value": "-5",
    "error": "precio: price must be greater than 0"
}))]
pub struct RowError {
    pub row: i64,
    pub field: String,
    pub value: String,
    pub error: String,
}

/// Result of one import run, as returned to the uploader.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    pub log_id: Uuid,
    pub filename: String,
    pub total_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,
    pub status: ImportStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RowError>>,
}

#[derive(Debug, Clone, Copy)]
enum FileKind {
    Csv,
    /// XLSX and legacy XLS; both decode through the same reader
    Spreadsheet,
}

/// Decoded upload: ordered rows of column-name → raw cell text.
struct Table {
    headers: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

/// The known columns of one row, pulled out of the raw mapping and
/// normalized: a missing or blank description becomes `None`, every other
/// missing cell an empty string so the typed parse below sees real input.
struct RawRecord {
    nombre: String,
    descripcion: Option<String>,
    precio: String,
    stock: String,
    categoria: String,
}

impl RawRecord {
    fn from_row(row: &HashMap<String, String>) -> Self {
        let cell = |key: &str| row.get(key).cloned().unwrap_or_default();
        let descripcion = row
            .get("descripcion")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            nombre: cell("nombre"),
            descripcion,
            precio: cell("precio"),
            stock: cell("stock"),
            categoria: cell("categoria"),
        }
    }
}

struct RunOutcome {
    total_rows: i32,
    successful_rows: i32,
    failed_rows: i32,
    errors: Vec<RowError>,
}

/// Pipeline turning uploaded tabular files into persisted product rows with
/// row-level fault isolation, and back into CSV/Excel exports.
#[derive(Clone)]
pub struct ImportExportService {
    products: ProductService,
    import_logs: ImportLogService,
    batch_size: usize,
}

impl ImportExportService {
    pub fn new(products: ProductService, import_logs: ImportLogService, batch_size: usize) -> Self {
        Self {
            products,
            import_logs,
            batch_size: batch_size.max(1),
        }
    }

    /// Import products from an uploaded CSV or Excel file.
    ///
    /// Rows are validated independently; a malformed row is recorded and
    /// skipped, never aborting the run. Only whole-run failures (unreadable
    /// file, missing required columns, storage errors) propagate, and those
    /// finalize the audit log as `failed` before surfacing.
    #[instrument(skip(self, bytes), fields(filename = %filename, bytes = bytes.len()))]
    pub async fn import_products(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ImportSummary, ServiceError> {
        let kind = file_kind(filename)?;

        // The log exists before the first byte is parsed, so even an import
        // that dies mid-parse stays auditable.
        let log = self.import_logs.create(filename).await?;

        match self.run_to_completion(&log, kind, bytes).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                self.fail_log(log.id, &err).await;
                Err(err)
            }
        }
    }

    async fn run_to_completion(
        &self,
        log: &import_log::Model,
        kind: FileKind,
        bytes: &[u8],
    ) -> Result<ImportSummary, ServiceError> {
        let outcome = self.run_import(kind, bytes).await?;

        let errors_json = if outcome.errors.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&outcome.errors).map_err(|e| {
                ServiceError::InternalError(format!("could not serialize row errors: {e}"))
            })?)
        };

        let finalized = self
            .import_logs
            .finalize(
                log.id,
                ImportLogOutcome {
                    status: ImportStatus::Completed,
                    total_rows: outcome.total_rows,
                    successful_rows: outcome.successful_rows,
                    failed_rows: outcome.failed_rows,
                    errors: errors_json,
                },
            )
            .await?;

        info!(
            log_id = %finalized.id,
            total = outcome.total_rows,
            successful = outcome.successful_rows,
            failed = outcome.failed_rows,
            "Import completed"
        );

        let message = format!(
            "Import finished: {} rows succeeded, {} failed",
            outcome.successful_rows, outcome.failed_rows
        );

        let RunOutcome {
            total_rows,
            successful_rows,
            failed_rows,
            mut errors,
        } = outcome;
        errors.truncate(MAX_SUMMARY_ERRORS);

        Ok(ImportSummary {
            log_id: finalized.id,
            filename: finalized.filename,
            total_rows,
            successful_rows,
            failed_rows,
            status: finalized.status,
            message,
            errors: (!errors.is_empty()).then_some(errors),
        })
    }

    async fn run_import(&self, kind: FileKind, bytes: &[u8]) -> Result<RunOutcome, ServiceError> {
        let table = parse_table(kind, bytes)?;

        let missing = missing_columns(&table.headers);
        if !missing.is_empty() {
            return Err(ServiceError::BadRequest(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let total_rows = table.rows.len() as i32;
        let mut successful_rows = 0i32;
        let mut errors: Vec<RowError> = Vec::new();
        let mut staged: Vec<NewProduct> = Vec::new();

        for (idx, row) in table.rows.iter().enumerate() {
            // visible file line: header is line 1, data is 1-based after it
            let row_number = (idx + 2) as i64;
            let record = RawRecord::from_row(row);

            match validate_row(&record, row_number) {
                Ok(product) => {
                    successful_rows += 1;
                    staged.push(product);
                    if staged.len() >= self.batch_size {
                        self.products
                            .bulk_create(std::mem::take(&mut staged))
                            .await?;
                    }
                }
                Err(row_error) => errors.push(row_error),
            }
        }

        if !staged.is_empty() {
            self.products.bulk_create(staged).await?;
        }

        Ok(RunOutcome {
            total_rows,
            successful_rows,
            failed_rows: errors.len() as i32,
            errors,
        })
    }

    /// Force the in-flight log to `failed` carrying the run error, so the
    /// audit state never disagrees with what the client was told.
    async fn fail_log(&self, log_id: Uuid, err: &ServiceError) {
        let entry = RowError {
            row: 0,
            field: "file".to_string(),
            value: String::new(),
            error: err.to_string(),
        };
        let errors = serde_json::to_string(&vec![entry]).ok();

        let outcome = ImportLogOutcome {
            status: ImportStatus::Failed,
            total_rows: 0,
            successful_rows: 0,
            failed_rows: 0,
            errors,
        };

        if let Err(finalize_err) = self.import_logs.finalize(log_id, outcome).await {
            error!(
                log_id = %log_id,
                error = %finalize_err,
                "Could not record import failure in its log"
            );
        }
    }

    /// Export the full product table as CSV, in the fixed column order
    /// `{id, nombre, descripcion, precio, stock, categoria}`.
    #[instrument(skip(self))]
    pub async fn export_to_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let products = self.products.export_all().await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(EXPORT_COLUMNS)
            .map_err(csv_write_error)?;

        for product in products {
            writer
                .write_record(&[
                    product.id.to_string(),
                    product.name,
                    product.description.unwrap_or_default(),
                    format!("{:.2}", product.price),
                    product.stock.to_string(),
                    product.category,
                ])
                .map_err(csv_write_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("could not flush CSV export: {e}")))
    }

    /// Export the full product table as an XLSX workbook, same column order
    /// as the CSV export.
    #[instrument(skip(self))]
    pub async fn export_to_excel(&self) -> Result<Vec<u8>, ServiceError> {
        let products = self.products.export_all().await?;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Productos").map_err(xlsx_error)?;

        for (col, header) in EXPORT_COLUMNS.iter().enumerate() {
            sheet
                .write_string(0, col as u16, *header)
                .map_err(xlsx_error)?;
        }

        for (idx, product) in products.iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet
                .write_string(row, 0, product.id.to_string())
                .map_err(xlsx_error)?;
            sheet
                .write_string(row, 1, product.name.as_str())
                .map_err(xlsx_error)?;
            sheet
                .write_string(row, 2, product.description.as_deref().unwrap_or(""))
                .map_err(xlsx_error)?;
            sheet
                .write_number(row, 3, product.price.to_f64().unwrap_or_default())
                .map_err(xlsx_error)?;
            sheet
                .write_number(row, 4, f64::from(product.stock))
                .map_err(xlsx_error)?;
            sheet
                .write_string(row, 5, product.category.as_str())
                .map_err(xlsx_error)?;
        }

        workbook.save_to_buffer().map_err(xlsx_error)
    }

    /// Paginated audit trail, most recent run first.
    pub async fn get_import_logs(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<import_log::Model>, u64), ServiceError> {
        self.import_logs.list(skip, limit).await
    }

    /// The failed rows of one run as a CSV attachment (`Fila, Campo, Valor,
    /// Error`). `NotFound` when the log is unknown or recorded no failures.
    #[instrument(skip(self))]
    pub async fn download_import_errors(&self, log_id: Uuid) -> Result<Vec<u8>, ServiceError> {
        let log = self.import_logs.get(log_id).await?;

        if log.failed_rows == 0 || log.errors.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Import log {log_id} has no recorded errors"
            )));
        }

        // A corrupted stored document degrades to an empty list rather than
        // failing the download.
        let errors: Vec<RowError> = log
            .errors
            .as_deref()
            .map(|raw| serde_json::from_str(raw).unwrap_or_default())
            .unwrap_or_default();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Fila", "Campo", "Valor", "Error"])
            .map_err(csv_write_error)?;

        for entry in errors {
            writer
                .write_record(&[
                    entry.row.to_string(),
                    entry.field,
                    entry.value,
                    entry.error,
                ])
                .map_err(csv_write_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("could not flush error CSV: {e}")))
    }
}

fn csv_write_error(err: csv::Error) -> ServiceError {
    ServiceError::InternalError(format!("could not write CSV: {err}"))
}

fn xlsx_error(err: rust_xlsxwriter::XlsxError) -> ServiceError {
    ServiceError::InternalError(format!("could not write workbook: {err}"))
}

fn file_kind(filename: &str) -> Result<FileKind, ServiceError> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "csv" => Ok(FileKind::Csv),
        "xlsx" | "xls" => Ok(FileKind::Spreadsheet),
        _ => Err(ServiceError::BadRequest(format!(
            "file format not allowed, use one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

fn missing_columns(headers: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .copied()
        .collect()
}

fn parse_table(kind: FileKind, bytes: &[u8]) -> Result<Table, ServiceError> {
    match kind {
        FileKind::Csv => parse_csv(bytes),
        FileKind::Spreadsheet => parse_spreadsheet(bytes),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Table, ServiceError> {
    let mut reader = csv::Reader::from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ServiceError::ParseError(format!("could not read CSV headers: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| ServiceError::ParseError(format!("could not decode CSV row: {e}")))?;

        let mut row = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            row.insert(header.clone(), record.get(idx).unwrap_or("").to_string());
        }
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

fn parse_spreadsheet(bytes: &[u8]) -> Result<Table, ServiceError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ServiceError::ParseError(format!("could not open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ServiceError::ParseError("spreadsheet has no sheets".to_string()))?
        .map_err(|e| ServiceError::ParseError(format!("could not read sheet: {e}")))?;

    let mut cell_rows = range.rows();
    let headers: Vec<String> = cell_rows
        .next()
        .map(|cells| {
            cells
                .iter()
                .map(|c| cell_to_string(c).trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut rows = Vec::new();
    for cells in cell_rows {
        let mut row = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let value = cells.get(idx).map(cell_to_string).unwrap_or_default();
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        // Spreadsheets hand back every numeric cell as a float; keep whole
        // numbers integral so they still parse as stock counts.
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Check one normalized record against the product creation contract. The
/// first offending field wins; columns are checked in file order.
fn validate_row(record: &RawRecord, row: i64) -> Result<NewProduct, RowError> {
    let fail = |field: &str, value: &str, message: &str| RowError {
        row,
        field: field.to_string(),
        value: value.to_string(),
        error: format!("{field}: {message}"),
    };

    if let Err(message) = product_service::check_name(&record.nombre) {
        return Err(fail("nombre", &record.nombre, &message));
    }

    let price = match Decimal::from_str(record.precio.trim()) {
        Ok(price) => match product_service::normalize_price(price) {
            Ok(price) => price,
            Err(message) => return Err(fail("precio", &record.precio, &message)),
        },
        Err(_) => return Err(fail("precio", &record.precio, "price must be a number")),
    };

    let stock = match record.stock.trim().parse::<i32>() {
        Ok(stock) => match product_service::check_stock(stock) {
            Ok(()) => stock,
            Err(message) => return Err(fail("stock", &record.stock, &message)),
        },
        Err(_) => return Err(fail("stock", &record.stock, "stock must be an integer")),
    };

    if let Err(message) = product_service::check_category(&record.categoria) {
        return Err(fail("categoria", &record.categoria, &message));
    }

    Ok(NewProduct {
        name: record.nombre.clone(),
        description: record.descripcion.clone(),
        price,
        stock,
        category: record.categoria.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(nombre: &str, precio: &str, stock: &str, categoria: &str) -> RawRecord {
        RawRecord {
            nombre: nombre.to_string(),
            descripcion: None,
            precio: precio.to_string(),
            stock: stock.to_string(),
            categoria: categoria.to_string(),
        }
    }

    #[test]
    fn extension_allow_list_is_enforced() {
        assert!(file_kind("productos.csv").is_ok());
        assert!(file_kind("productos.XLSX").is_ok());
        assert!(file_kind("productos.xls").is_ok());
        assert!(matches!(
            file_kind("productos.pdf"),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(matches!(
            file_kind("productos"),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn missing_columns_are_reported_in_schema_order() {
        let headers = vec!["nombre".to_string(), "precio".to_string()];
        assert_eq!(
            missing_columns(&headers),
            vec!["descripcion", "stock", "categoria"]
        );

        let complete: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(missing_columns(&complete).is_empty());
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = b"nombre,descripcion,precio,stock,categoria,proveedor\n\
            Teclado mecanico,RGB,59.90,12,Perifericos,ACME\n";
        let table = parse_csv(csv).unwrap();
        assert!(missing_columns(&table.headers).is_empty());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["nombre"], "Teclado mecanico");
    }

    #[test]
    fn blank_description_normalizes_to_none() {
        let mut row = HashMap::new();
        row.insert("nombre".to_string(), "Monitor 24".to_string());
        row.insert("descripcion".to_string(), "  ".to_string());
        row.insert("precio".to_string(), "120".to_string());
        row.insert("stock".to_string(), "3".to_string());
        row.insert("categoria".to_string(), "Pantallas".to_string());

        let record = RawRecord::from_row(&row);
        assert!(record.descripcion.is_none());
        assert_eq!(record.nombre, "Monitor 24");
    }

    #[test]
    fn missing_cells_normalize_to_empty_strings() {
        let row = HashMap::new();
        let record = RawRecord::from_row(&row);
        assert_eq!(record.precio, "");
        assert_eq!(record.stock, "");
        assert!(record.descripcion.is_none());
    }

    #[test]
    fn valid_row_parses_and_rounds_price() {
        let product = validate_row(&record("Camiseta azul", "10.499", "5", "Ropa"), 2).unwrap();
        assert_eq!(product.price, dec!(10.50));
        assert_eq!(product.stock, 5);
    }

    #[test]
    fn non_positive_price_is_rejected_with_field_prefix() {
        let err = validate_row(&record("Camiseta azul", "-5", "5", "Ropa"), 3).unwrap_err();
        assert_eq!(err.row, 3);
        assert_eq!(err.field, "precio");
        assert_eq!(err.value, "-5");
        assert!(err.error.starts_with("precio:"));
    }

    #[test]
    fn short_name_is_the_first_reported_field() {
        // both the name and the price are bad; the first file column wins
        let err = validate_row(&record("ab", "-1", "5", "Ropa"), 4).unwrap_err();
        assert_eq!(err.field, "nombre");
    }

    #[test]
    fn negative_and_non_integer_stock_are_rejected() {
        let err = validate_row(&record("Camiseta azul", "10", "-1", "Ropa"), 2).unwrap_err();
        assert_eq!(err.field, "stock");
        assert!(err.error.contains("negative"));

        let err = validate_row(&record("Camiseta azul", "10", "2.5", "Ropa"), 2).unwrap_err();
        assert_eq!(err.field, "stock");
        assert!(err.error.contains("integer"));
    }

    #[test]
    fn empty_category_is_rejected() {
        let err = validate_row(&record("Camiseta azul", "10", "1", ""), 2).unwrap_err();
        assert_eq!(err.field, "categoria");
    }

    #[test]
    fn whole_number_cells_stay_integral() {
        assert_eq!(cell_to_string(&Data::Float(10.0)), "10");
        assert_eq!(cell_to_string(&Data::Float(10.5)), "10.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn csv_rows_map_headers_to_cells() {
        let csv = b"nombre,descripcion,precio,stock,categoria\n\
            Raton inalambrico,,19.99,30,Perifericos\n\
            Alfombrilla,XL,9.5,100,Perifericos\n";
        let table = parse_csv(csv).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["precio"], "19.99");
        assert_eq!(table.rows[1]["descripcion"], "XL");
    }
}
