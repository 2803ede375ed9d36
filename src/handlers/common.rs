use crate::config::AppConfig;
use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Offset/limit pagination parameters for list operations
#[derive(Debug, Clone, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Number of records to skip
    #[serde(default)]
    pub skip: u64,
    /// Maximum number of records to return; bounded by the configured page
    /// size cap
    #[serde(default)]
    pub limit: Option<u64>,
}

impl PageParams {
    /// Resolve the effective page size against the configured bounds.
    pub fn resolve_limit(&self, config: &AppConfig) -> Result<u64, ApiError> {
        match self.limit {
            None => Ok(config.default_page_size),
            Some(0) => Err(ApiError::ValidationError(
                "limit must be greater than zero".to_string(),
            )),
            Some(limit) if limit > config.max_page_size => Err(ApiError::ValidationError(format!(
                "limit cannot exceed {}",
                config.max_page_size
            ))),
            Some(limit) => Ok(limit),
        }
    }
}

/// Standard paginated list payload
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse<T> {
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
    pub items: Vec<T>,
}

pub fn normalize_string(value: String) -> String {
    value.trim().to_string()
}

pub fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .and_then(|v| if v.is_empty() { None } else { Some(v) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:",
            "a_sufficiently_long_secret_for_testing_purposes",
            3600,
            "127.0.0.1",
            0,
            "test",
        )
    }

    #[test]
    fn missing_limit_falls_back_to_default() {
        let params = PageParams {
            skip: 0,
            limit: None,
        };
        assert_eq!(params.resolve_limit(&config()).unwrap(), 50);
    }

    #[test]
    fn limit_bounds_are_enforced() {
        let cfg = config();
        let zero = PageParams {
            skip: 0,
            limit: Some(0),
        };
        assert!(zero.resolve_limit(&cfg).is_err());

        let oversized = PageParams {
            skip: 0,
            limit: Some(cfg.max_page_size + 1),
        };
        assert!(oversized.resolve_limit(&cfg).is_err());

        let fine = PageParams {
            skip: 10,
            limit: Some(25),
        };
        assert_eq!(fine.resolve_limit(&cfg).unwrap(), 25);
    }

    #[test]
    fn optional_strings_are_trimmed_to_none() {
        assert_eq!(normalize_optional_string(Some("  ".into())), None);
        assert_eq!(
            normalize_optional_string(Some(" ok ".into())),
            Some("ok".into())
        );
        assert_eq!(normalize_optional_string(None), None);
    }
}
