use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventario API",
        version = "0.1.0",
        description = r#"
# Inventario API

Authenticated inventory management: product CRUD, bulk import from CSV/Excel
files, bulk export, and an audit trail of import runs.

## Authentication

All `/products` endpoints require a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Obtain one via `POST /auth/register` followed by `POST /auth/token`.

## Bulk import

`POST /products/import` accepts a multipart upload (`file` field) with the
case-sensitive columns `nombre, descripcion, precio, stock, categoria`. Rows
are validated independently: invalid rows are recorded in the import log and
skipped, valid rows are persisted. The failed rows of a run can be downloaded
again as CSV from `/products/import-logs/{id}/download-errors`.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "Auth", description = "Registration and token issuance"),
        (name = "Products", description = "Product CRUD endpoints"),
        (name = "Import/Export", description = "Bulk import/export and audit logs")
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::import_export::import_products,
        crate::handlers::import_export::export_products_csv,
        crate::handlers::import_export::export_products_excel,
        crate::handlers::import_export::list_import_logs,
        crate::handlers::import_export::download_import_errors,
    ),
    components(
        schemas(
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::UserResponse,
            crate::auth::AccessToken,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::products::ProductResponse,
            crate::handlers::import_export::ImportLogResponse,
            crate::services::import_export_service::ImportSummary,
            crate::services::import_export_service::RowError,
            crate::entities::import_log::ImportStatus,
            crate::errors::ErrorResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
