//! Integration tests for the product CRUD surface: creation invariants,
//! partial updates, filtered listing, and the auth gate.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use serde_json::json;

async fn seed_product(app: &TestApp, name: &str, price: &str, stock: i64, category: &str) -> String {
    let response = app
        .request_authenticated(
            Method::POST,
            "/products",
            Some(json!({
                "name": name,
                "price": price,
                "stock": stock,
                "category": category
            })),
        )
        .await;
    assert_eq!(response.status(), 201, "seed product '{name}'");
    response_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_and_fetch_a_product() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/products",
            Some(json!({
                "name": "Teclado mecanico RGB",
                "description": "Switches rojos",
                "price": "59.90",
                "stock": 12,
                "category": "Perifericos"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let created = response_json(response).await;
    assert_eq!(created["name"], "Teclado mecanico RGB");
    assert_eq!(created["price"], "59.90");
    assert_eq!(created["stock"], 12);
    assert!(created["created_at"].is_string());
    let id = created["id"].as_str().unwrap();

    let response = app
        .request_authenticated(Method::GET, &format!("/products/{id}"), None)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["id"], *id);
}

#[tokio::test]
async fn creation_invariants_are_enforced() {
    let app = TestApp::new().await;

    let cases = [
        json!({"name": "ab", "price": "10.00", "stock": 1, "category": "Ropa"}),
        json!({"name": "Nombre valido", "price": "-5", "stock": 1, "category": "Ropa"}),
        json!({"name": "Nombre valido", "price": "0", "stock": 1, "category": "Ropa"}),
        json!({"name": "Nombre valido", "price": "10.00", "stock": -1, "category": "Ropa"}),
        json!({"name": "Nombre valido", "price": "10.00", "stock": 1, "category": ""}),
    ];

    for payload in cases {
        let response = app
            .request_authenticated(Method::POST, "/products", Some(payload.clone()))
            .await;
        assert_eq!(response.status(), 400, "payload should be rejected: {payload}");
    }

    let listing = app
        .request_authenticated(Method::GET, "/products", None)
        .await;
    assert_eq!(response_json(listing).await["total"], 0);
}

#[tokio::test]
async fn price_is_rounded_to_two_decimals_on_create() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/products",
            Some(json!({
                "name": "Auriculares inalambricos",
                "price": "19.999",
                "stock": 3,
                "category": "Audio"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(response_json(response).await["price"], "20.00");
}

#[tokio::test]
async fn update_merges_only_the_provided_fields() {
    let app = TestApp::new().await;
    let id = seed_product(&app, "Monitor 24 pulgadas", "120.00", 4, "Pantallas").await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{id}"),
            Some(json!({"price": "99.90"})),
        )
        .await;
    assert_eq!(response.status(), 200);

    let updated = response_json(response).await;
    assert_eq!(updated["price"], "99.90");
    assert_eq!(updated["name"], "Monitor 24 pulgadas");
    assert_eq!(updated["stock"], 4);
    assert!(updated["updated_at"].is_string());

    // invalid partial updates are rejected without touching the row
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{id}"),
            Some(json!({"stock": -3})),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request_authenticated(Method::GET, &format!("/products/{id}"), None)
        .await;
    assert_eq!(response_json(response).await["stock"], 4);
}

#[tokio::test]
async fn missing_products_return_not_found() {
    let app = TestApp::new().await;
    let unknown = uuid::Uuid::new_v4();

    let response = app
        .request_authenticated(Method::GET, &format!("/products/{unknown}"), None)
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{unknown}"),
            Some(json!({"price": "10.00"})),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/products/{unknown}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn delete_removes_the_product() {
    let app = TestApp::new().await;
    let id = seed_product(&app, "Alfombrilla XL", "9.50", 100, "Perifericos").await;

    let response = app
        .request_authenticated(Method::DELETE, &format!("/products/{id}"), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Alfombrilla XL"));

    let response = app
        .request_authenticated(Method::GET, &format!("/products/{id}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn listing_supports_filters_and_pagination() {
    let app = TestApp::new().await;

    seed_product(&app, "Camiseta azul", "10.00", 5, "Ropa").await;
    seed_product(&app, "Camiseta roja", "12.00", 0, "Ropa").await;
    seed_product(&app, "Zapatos deportivos", "49.99", 10, "Calzado").await;
    seed_product(&app, "Sandalias", "19.99", 2, "Calzado").await;

    // exact category match
    let response = app
        .request_authenticated(Method::GET, "/products?category=Ropa", None)
        .await;
    let page = response_json(response).await;
    assert_eq!(page["total"], 2);

    // case-insensitive name substring
    let response = app
        .request_authenticated(Method::GET, "/products?name=camiseta", None)
        .await;
    assert_eq!(response_json(response).await["total"], 2);

    // price window
    let response = app
        .request_authenticated(
            Method::GET,
            "/products?price_min=15&price_max=50",
            None,
        )
        .await;
    let page = response_json(response).await;
    assert_eq!(page["total"], 2);

    // stock floor
    let response = app
        .request_authenticated(Method::GET, "/products?stock_min=5", None)
        .await;
    assert_eq!(response_json(response).await["total"], 2);

    // pagination window, total unaffected
    let response = app
        .request_authenticated(Method::GET, "/products?skip=1&limit=2", None)
        .await;
    let page = response_json(response).await;
    assert_eq!(page["total"], 4);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["skip"], 1);
    assert_eq!(page["limit"], 2);

    // limits beyond the configured cap are rejected
    let over = app.state.config.max_page_size + 1;
    let response = app
        .request_authenticated(Method::GET, &format!("/products?limit={over}"), None)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn product_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/products", None, None).await;
    assert_eq!(response.status(), 401);

    let response = app
        .request(Method::GET, "/products", None, Some("not-a-real-token"))
        .await;
    assert_eq!(response.status(), 401);

    // health stays public
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), 200);
}
