use super::common::{
    created_response, map_service_error, normalize_optional_string, normalize_string,
    success_response, validate_input, ListResponse,
};
use crate::{
    errors::ApiError,
    services::product_service::{NewProduct, ProductFilter, UpdateProduct},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Creates the router for product CRUD endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
}

// Request and response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Teclado mecanico RGB",
    "description": "Switches rojos, layout ES",
    "price": "59.90",
    "stock": 12,
    "category": "Perifericos"
}))]
pub struct CreateProductRequest {
    /// Product name (3-255 characters)
    #[validate(length(min = 3, max = 255))]
    #[schema(example = "Teclado mecanico RGB")]
    pub name: String,
    /// Optional free-form description
    #[serde(default)]
    #[schema(example = "Switches rojos, layout ES")]
    pub description: Option<String>,
    /// Unit price, must be greater than 0
    #[schema(example = "59.90")]
    pub price: Decimal,
    /// Units on hand, cannot be negative
    #[schema(example = 12)]
    pub stock: i32,
    /// Category name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Perifericos")]
    pub category: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 3, max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[schema(example = "59.90")]
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<crate::entities::product::Model> for ProductResponse {
    fn from(model: crate::entities::product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            category: model.category,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    /// Number of records to skip
    #[serde(default)]
    pub skip: u64,
    /// Maximum number of records to return
    #[serde(default)]
    pub limit: Option<u64>,
    /// Exact category match
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive name substring
    #[serde(default)]
    pub name: Option<String>,
    /// Lower price bound (inclusive)
    #[serde(default)]
    pub price_min: Option<Decimal>,
    /// Upper price bound (inclusive)
    #[serde(default)]
    pub price_max: Option<Decimal>,
    /// Minimum stock on hand
    #[serde(default)]
    pub stock_min: Option<i32>,
}

// Handler functions

/// List products with optional filters and pagination
#[utoipa::path(
    get,
    path = "/products",
    params(ProductListParams),
    responses(
        (status = 200, description = "Products listed", body = ListResponse<ProductResponse>),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = super::common::PageParams {
        skip: params.skip,
        limit: params.limit,
    };
    let limit = page.resolve_limit(&state.config)?;

    let filter = ProductFilter {
        category: normalize_optional_string(params.category),
        name: normalize_optional_string(params.name),
        price_min: params.price_min,
        price_max: params.price_max,
        stock_min: params.stock_min,
    };

    let (items, total) = state
        .services
        .products
        .list(&filter, params.skip, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ListResponse {
        total,
        skip: params.skip,
        limit,
        items: items
            .into_iter()
            .map(ProductResponse::from)
            .collect::<Vec<_>>(),
    }))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = ProductResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = NewProduct {
        name: normalize_string(payload.name),
        description: normalize_optional_string(payload.description),
        price: payload.price,
        stock: payload.stock,
        category: normalize_string(payload.category),
    };

    let product = state
        .services
        .products
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Update an existing product; omitted fields keep their stored values
#[utoipa::path(
    put,
    path = "/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateProduct {
        name: payload.name.map(normalize_string),
        description: normalize_optional_string(payload.description),
        price: payload.price,
        stock: payload.stock,
        category: payload.category.map(normalize_string),
    };

    let product = state
        .services
        .products
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/:id",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .services
        .products
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": format!("Product '{}' deleted", deleted.name)
    })))
}
