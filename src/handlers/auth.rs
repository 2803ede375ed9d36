use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::{AccessToken, RegisterInput},
    errors::ApiError,
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for authentication endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
}

// Request and response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "username": "maria",
    "email": "maria@example.com",
    "password": "SecurePass123!"
}))]
pub struct RegisterRequest {
    /// Unique username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    #[schema(example = "maria")]
    pub username: String,

    /// Unique email address
    #[validate(email)]
    #[schema(example = "maria@example.com")]
    pub email: String,

    /// Password (minimum 8 characters); stored only as an argon2 hash
    #[validate(length(min = 8))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "username": "maria",
    "password": "SecurePass123!"
}))]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::auth::user::Model> for UserResponse {
    fn from(model: crate::auth::user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

// Handler functions

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let user = state
        .services
        .auth
        .register(RegisterInput {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(UserResponse::from(user)))
}

/// Exchange a username/password pair for a bearer token
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AccessToken),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services
        .auth
        .authenticate(&payload.username, &payload.password)
        .await
        .map_err(map_service_error)?;

    let token = state
        .services
        .auth
        .generate_token(&user)
        .map_err(|e| map_service_error(e.into()))?;

    Ok(success_response(token))
}
