//! Router tests over the in-memory demo stores.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use std::collections::HashMap;
use storefront_orders::{Config, Resources, build_router};
use tower::ServiceExt;

fn app() -> Router {
    app_with(&[])
}

fn app_with(extra: &[(&str, &str)]) -> Router {
    let mut vars = HashMap::from([(
        "AUTH_TOKENS".to_string(),
        "t-admin=admin:admin,t-john=john,t-jane=jane".to_string(),
    )]);
    vars.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    build_router(Resources::in_memory().app_state(&config))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn checkout_body(product_id: &str, quantity: i64) -> String {
    json!({
        "order_items": [{ "product_id": product_id, "quantity": quantity }],
        "shipping_address": {
            "address": "1 Main St",
            "city": "Boston",
            "postal_code": "02101",
            "country": "US"
        },
        "payment_method": "paypal"
    })
    .to_string()
}

fn payment_body() -> String {
    json!({ "payer_id": "PAYER-1", "transaction_id": "TXN-1" }).to_string()
}

async fn create(app: &Router, token: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/orders",
        Some(token),
        Some(checkout_body("airpods", 1)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_readiness() {
    let app = app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn catalog_is_public() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);

    let (status, body) = send(&app, "GET", "/api/products/airpods", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 8999);

    let (status, body) = send(&app, "GET", "/api/products/ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn orders_require_a_valid_token() {
    let app = app();
    let body = Some(checkout_body("airpods", 1));

    let (status, _) = send(&app, "POST", "/api/orders", None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/api/orders", Some("t-unknown"), body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn checkout_prices_and_reserves() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some("t-john"),
        Some(checkout_body("airpods", 2)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], "john");
    assert_eq!(body["status"], "created");
    assert_eq!(body["is_paid"], false);
    assert_eq!(body["order_items"][0]["name"], "Airpods Wireless Bluetooth Headphones");
    assert_eq!(body["items_price"], 17_998);
    assert_eq!(body["tax_price"], 2700);
    assert_eq!(body["shipping_price"], 0);
    assert_eq!(body["total_price"], 20_698);

    let (_, product) = send(&app, "GET", "/api/products/airpods", None, None).await;
    assert_eq!(product["count_in_stock"], 8);
}

#[tokio::test]
async fn rejected_checkouts_map_to_statuses() {
    let app = app();
    let john = Some("t-john");

    let (status, body) = send(&app, "POST", "/api/orders", john, Some(checkout_body("echo", 1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (status, body) = send(&app, "POST", "/api/orders", john, Some(checkout_body("ghost", 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");

    let (status, body) = send(&app, "POST", "/api/orders", john, Some(checkout_body("airpods", 0))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_LINE_ITEM");

    let empty = json!({
        "order_items": [],
        "shipping_address": { "address": "a", "city": "b", "postal_code": "c", "country": "US" },
        "payment_method": "paypal"
    });
    let (status, body) = send(&app, "POST", "/api/orders", john, Some(empty.to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "EMPTY_CART");
}

#[tokio::test]
async fn malformed_payloads_are_rejected_before_checkout() {
    let app = app();
    let john = Some("t-john");

    let (status, _) = send(&app, "POST", "/api/orders", john, Some("{oops".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/api/orders", john, Some(checkout_body("airpods", -1))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let mut priced: Value = serde_json::from_str(&checkout_body("airpods", 1)).unwrap();
    priced["order_items"][0]["price"] = json!(1);
    let (status, _) = send(&app, "POST", "/api/orders", john, Some(priced.to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, product) = send(&app, "GET", "/api/products/airpods", None, None).await;
    assert_eq!(product["count_in_stock"], 10);
}

#[tokio::test]
async fn payment_and_delivery_flow() {
    let app = app();
    let id = create(&app, "t-john").await;
    let pay = format!("/api/orders/{id}/pay");
    let deliver = format!("/api/orders/{id}/deliver");

    let (status, body) = send(&app, "PUT", &deliver, Some("t-admin"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NOT_YET_PAID");

    let (status, body) = send(&app, "PUT", &pay, Some("t-john"), Some(payment_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_paid"], true);
    assert_eq!(body["payment_result"]["transaction_id"], "TXN-1");

    let (status, body) = send(&app, "PUT", &pay, Some("t-john"), Some(payment_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_PAID");

    let (status, _) = send(&app, "PUT", &deliver, Some("t-john"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &deliver, Some("t-admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "delivered");
    assert_eq!(body["is_delivered"], true);
}

#[tokio::test]
async fn blank_payment_evidence_is_unprocessable() {
    let app = app();
    let id = create(&app, "t-john").await;

    let blank = json!({ "payer_id": "", "transaction_id": "TXN-1" }).to_string();
    let (status, body) = send(&app, "PUT", &format!("/api/orders/{id}/pay"), Some("t-john"), Some(blank)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_PAYMENT_EVIDENCE");
}

#[tokio::test]
async fn order_access_is_owner_or_admin() {
    let app = app();
    let id = create(&app, "t-john").await;
    let uri = format!("/api/orders/{id}");

    let (status, _) = send(&app, "GET", &uri, Some("t-john"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &uri, Some("t-admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", &uri, Some("t-jane"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = send(&app, "GET", "/api/orders/missing", Some("t-john"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORDER_NOT_FOUND");

    let (status, _) = send(&app, "PUT", &format!("{uri}/pay"), Some("t-jane"), Some(payment_body())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_orders() {
    let app = app();
    let id = create(&app, "t-john").await;
    let uri = format!("/api/orders/{id}");

    let (status, _) = send(&app, "DELETE", &uri, Some("t-jane"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some("t-john"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some("t-john"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings() {
    let app = app();
    let first = create(&app, "t-john").await;
    let second = create(&app, "t-jane").await;

    let (status, _) = send(&app, "GET", "/api/orders", Some("t-john"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/orders", Some("t-admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    let all = body.as_array().unwrap();
    assert_eq!(all.len(), 2);
    let john_order = all.iter().find(|o| o["id"] == first.as_str()).unwrap();
    assert_eq!(john_order["customer"]["name"], "John Doe");
    assert_eq!(john_order["customer"]["email"], "john.doe@example.com");

    let (status, body) = send(&app, "GET", "/api/orders/mine", Some("t-jane"), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = body.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], second.as_str());
}

#[tokio::test]
async fn responses_carry_correlation_id() {
    let app = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-correlation-id"));
}

#[tokio::test]
async fn cors_allows_configured_origins_only() {
    let app = app_with(&[("CORS_ALLOWED_ORIGINS", "https://shop.example")]);
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/orders")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(preflight("https://shop.example")).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://shop.example"
    );

    let response = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
