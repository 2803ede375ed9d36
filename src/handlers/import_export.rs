use super::common::{map_service_error, success_response, ListResponse, PageParams};
use crate::{
    entities::import_log::{self, ImportStatus},
    errors::ApiError,
    services::import_export_service::ImportSummary,
    AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Creates the router for import/export endpoints, mounted under /products
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/import", post(import_products))
        .route("/export/csv", get(export_products_csv))
        .route("/export/excel", get(export_products_excel))
        .route("/import-logs", get(list_import_logs))
        .route("/import-logs/:id/download-errors", get(download_import_errors))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportLogResponse {
    pub id: Uuid,
    pub filename: String,
    pub total_rows: i32,
    pub successful_rows: i32,
    pub failed_rows: i32,
    /// Raw JSON document with the structured row errors, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    pub status: ImportStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<import_log::Model> for ImportLogResponse {
    fn from(model: import_log::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            total_rows: model.total_rows,
            successful_rows: model.successful_rows,
            failed_rows: model.failed_rows,
            errors: model.errors,
            status: model.status,
            started_at: model.started_at,
            completed_at: model.completed_at,
        }
    }
}

/// Import products from an uploaded CSV or Excel file
#[utoipa::path(
    post,
    path = "/products/import",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import finished", body = ImportSummary),
        (status = 400, description = "Rejected file or missing columns", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Import aborted; the log records the failure", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Import/Export"
)]
pub async fn import_products(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart request: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    ApiError::BadRequest("uploaded file must have a filename".to_string())
                })?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("could not read uploaded file: {e}")))?;

            upload = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) = upload
        .ok_or_else(|| ApiError::BadRequest("missing multipart field 'file'".to_string()))?;

    if bytes.len() > state.config.max_upload_size {
        return Err(ApiError::BadRequest(
            "uploaded file exceeds the maximum allowed size".to_string(),
        ));
    }

    let summary = state
        .services
        .import_export
        .import_products(&filename, &bytes)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Export all products as a CSV attachment
#[utoipa::path(
    get,
    path = "/products/export/csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Import/Export"
)]
pub async fn export_products_csv(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .services
        .import_export
        .export_to_csv()
        .await
        .map_err(map_service_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"productos_export.csv\"".to_string(),
            ),
        ],
        bytes,
    ))
}

/// Export all products as an Excel attachment
#[utoipa::path(
    get,
    path = "/products/export/excel",
    responses(
        (status = 200, description = "XLSX export", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Import/Export"
)]
pub async fn export_products_excel(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .services
        .import_export
        .export_to_excel()
        .await
        .map_err(map_service_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"productos_export.xlsx\"".to_string(),
            ),
        ],
        bytes,
    ))
}

/// Paginated import history, most recent run first
#[utoipa::path(
    get,
    path = "/products/import-logs",
    params(PageParams),
    responses(
        (status = 200, description = "Import logs listed", body = ListResponse<ImportLogResponse>),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Import/Export"
)]
pub async fn list_import_logs(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.resolve_limit(&state.config)?;

    let (items, total) = state
        .services
        .import_export
        .get_import_logs(params.skip, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ListResponse {
        total,
        skip: params.skip,
        limit,
        items: items
            .into_iter()
            .map(ImportLogResponse::from)
            .collect::<Vec<_>>(),
    }))
}

/// Download the failed rows of one import as CSV
#[utoipa::path(
    get,
    path = "/products/import-logs/:id/download-errors",
    params(("id" = Uuid, Path, description = "Import log ID")),
    responses(
        (status = 200, description = "Error rows as CSV", content_type = "text/csv"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown log or log without errors", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Import/Export"
)]
pub async fn download_import_errors(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .services
        .import_export
        .download_import_errors(id)
        .await
        .map_err(map_service_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"import_errors_{id}.csv\""),
            ),
        ],
        bytes,
    ))
}
