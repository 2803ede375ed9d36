#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use inventario_api::{
    auth::{AuthConfig, AuthService, RegisterInput},
    config::AppConfig,
    db,
    handlers::AppServices,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
const MULTIPART_BOUNDARY: &str = "inventario-test-boundary";

/// Helper harness spinning up the application against an in-memory SQLite
/// database, with one registered user and a valid bearer token.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:",
            TEST_JWT_SECRET,
            3600,
            "127.0.0.1",
            0,
            "test",
        );
        // A single connection keeps every query on the same in-memory
        // database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::ensure_schema(&pool)
            .await
            .expect("failed to create test schema");

        let db_arc = Arc::new(pool);
        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), &cfg, auth_service.clone());
        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        let user = auth_service
            .register(RegisterInput {
                username: "tester".to_string(),
                email: "tester@example.com".to_string(),
                password: "TestPass123!".to_string(),
            })
            .await
            .expect("seed test user");
        let token = auth_service
            .generate_token(&user)
            .expect("seed bearer token")
            .access_token;

        let router = inventario_api::app(state.clone());

        Self {
            router,
            state,
            token,
        }
    }

    /// Access the bearer token for the seeded user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        let token = self.token.clone();
        self.request(method, uri, body, Some(&token)).await
    }

    /// Upload a file as an authenticated `multipart/form-data` request with a
    /// single `file` field.
    pub async fn upload_file(
        &self,
        uri: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Response {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("failed to build multipart request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during upload")
    }
}

/// Read a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response body")
}

/// Read a response body as raw bytes.
pub async fn response_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes")
        .to_vec()
}
