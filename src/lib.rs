//! Inventario API Library
//!
//! This crate provides the core functionality for the Inventario API:
//! authenticated product CRUD, bulk CSV/Excel import with an audit trail,
//! and full-table exports.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// Builds the full application router for the given state.
pub fn app(state: AppState) -> Router {
    let auth_service = state.services.auth.clone();
    let max_upload_size = state.config.max_upload_size;
    let cors = cors_layer(&state.config);

    // Every /products route (CRUD and import/export alike) sits behind the
    // bearer-token gate.
    let protected = Router::new()
        .merge(handlers::products::routes())
        .merge(handlers::import_export::routes())
        .with_auth();

    Router::new()
        .route("/", get(|| async { "inventario-api up" }))
        .route("/health", get(health::health_check))
        .nest("/auth", handlers::auth::routes())
        .nest("/products", protected)
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_upload_size))
        // Inject the auth service into request extensions for the auth
        // middleware
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<auth::AuthService>>,
             mut req: axum::extract::Request,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .with_state(state)
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.is_development() {
        info!("Using permissive CORS because explicit origins were not configured");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}
