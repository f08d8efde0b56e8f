mod common;

use axum::http::StatusCode;
use common::*;
use farmnest_backend::model::user::UserRole;
use farmnest_backend::repository::product_repo::ProductRepository;
use serde_json::json;
use tower::ServiceExt; // for .oneshot()

fn shipping_address() -> serde_json::Value {
    json!({
        "address": "12 Market Lane",
        "city": "Algiers",
        "postalCode": "16000",
        "country": "DZ"
    })
}

fn order_body(product_id: &str, quantity: i64, total: f64) -> serde_json::Value {
    json!({
        "orderItems": [{ "product": product_id, "quantity": quantity }],
        "shippingAddress": shipping_address(),
        "paymentMethod": "CashOnDelivery",
        "totalPrice": total
    })
}

#[tokio::test]
async fn test_register_verify_and_place_order_end_to_end() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 5))
        .await
        .unwrap();
    let product_id = product.id.unwrap();

    // Register and verify over HTTP, like a storefront would
    let register = json!({
        "name": "alice",
        "email": "alice@example.com",
        "password": "password123"
    });
    let resp = backend
        .router
        .clone()
        .oneshot(json_request("POST", "/auth/register", &register))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let code = backend.mailer.last_otp_for("alice@example.com").unwrap();
    let verify = json!({ "email": "alice@example.com", "otp": code });
    let resp = backend
        .router
        .clone()
        .oneshot(json_request("POST", "/auth/verify-otp", &verify))
        .await
        .unwrap();
    let (status, verified) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    let token = verified["token"].as_str().unwrap().to_string();

    // Two units of a stock-five product
    let body = order_body(&product_id.to_hex(), 2, 5.0);
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/orders", &token, &body))
        .await
        .unwrap();
    let (status, placed) = response_json(resp).await;

    assert_eq!(status, StatusCode::CREATED);
    let order_id = placed["orderId"].as_str().expect("orderId missing");
    assert_eq!(placed["order"]["order_status"], "pending");
    assert_eq!(placed["order"]["is_paid"], false);
    assert_eq!(placed["order"]["total_price"], 5.0);
    assert_eq!(backend.product_repo.stock_of(product_id), Some(3));

    // The order shows up in the buyer's history, snapshot intact
    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", "/orders/myorders", &token))
        .await
        .unwrap();
    let (status, mine) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    let list = mine.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["_id"]["$oid"], order_id);
    assert_eq!(list[0]["items"][0]["name"], "Apples");
    assert_eq!(list[0]["items"][0]["price"], 2.5);
    assert_eq!(list[0]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_place_order_requires_token() {
    let backend = test_backend();

    let body = order_body(&bson::oid::ObjectId::new().to_hex(), 1, 2.5);
    let resp = backend
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Not authorized, no token");
}

#[tokio::test]
async fn test_place_order_rejects_card_payment() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 5))
        .await
        .unwrap();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    let token = login_token(&backend.router, "alice@example.com", "password123").await;

    let mut body = order_body(&product.id.unwrap().to_hex(), 1, 2.5);
    body["paymentMethod"] = json!("CreditCard");
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/orders", &token, &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("CashOnDelivery"));
}

#[tokio::test]
async fn test_place_order_insufficient_stock_answers_bad_request() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 1))
        .await
        .unwrap();
    let product_id = product.id.unwrap();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    let token = login_token(&backend.router, "alice@example.com", "password123").await;

    let body = order_body(&product_id.to_hex(), 3, 7.5);
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/orders", &token, &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "InsufficientStock");
    // Nothing was claimed
    assert_eq!(backend.product_repo.stock_of(product_id), Some(1));
    assert_eq!(backend.order_repo.count(), 0);
}

#[tokio::test]
async fn test_place_order_rejects_doctored_total() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 5))
        .await
        .unwrap();
    let product_id = product.id.unwrap();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    let token = login_token(&backend.router, "alice@example.com", "password123").await;

    // Client claims two apples cost one cent
    let body = order_body(&product_id.to_hex(), 2, 0.01);
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/orders", &token, &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("total"));
    assert_eq!(backend.product_repo.stock_of(product_id), Some(5));
}

#[tokio::test]
async fn test_get_order_owner_admin_and_stranger() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 5))
        .await
        .unwrap();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    seed_user(
        backend.user_repo.as_ref(),
        "mallory",
        "mallory@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    seed_user(
        backend.user_repo.as_ref(),
        "root",
        "admin@example.com",
        "changeme123",
        UserRole::Admin,
        true,
    )
    .await;

    let alice = login_token(&backend.router, "alice@example.com", "password123").await;
    let body = order_body(&product.id.unwrap().to_hex(), 1, 2.5);
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/orders", &alice, &body))
        .await
        .unwrap();
    let (_, placed) = response_json(resp).await;
    let order_uri = format!("/orders/{}", placed["orderId"].as_str().unwrap());

    // Owner reads it
    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", &order_uri, &alice))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A different customer does not
    let mallory = login_token(&backend.router, "mallory@example.com", "password123").await;
    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", &order_uri, &mallory))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // An admin does
    let admin = login_token(&backend.router, "admin@example.com", "changeme123").await;
    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", &order_uri, &admin))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_order_malformed_id_answers_not_found() {
    let backend = test_backend();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    let token = login_token(&backend.router, "alice@example.com", "password123").await;

    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", "/orders/not-a-hex-id", &token))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Order not found");
}

#[tokio::test]
async fn test_list_all_orders_is_admin_only() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 10))
        .await
        .unwrap();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    seed_user(
        backend.user_repo.as_ref(),
        "root",
        "admin@example.com",
        "changeme123",
        UserRole::Admin,
        true,
    )
    .await;
    let alice = login_token(&backend.router, "alice@example.com", "password123").await;

    let body = order_body(&product.id.unwrap().to_hex(), 1, 2.5);
    backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/orders", &alice, &body))
        .await
        .unwrap();

    // A customer cannot read the store-wide ledger
    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", "/orders", &alice))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = login_token(&backend.router, "admin@example.com", "changeme123").await;
    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", "/orders", &admin))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_my_orders_only_shows_own_history() {
    let backend = test_backend();
    let product = backend
        .product_repo
        .create(test_product("Apples", 2.5, 10))
        .await
        .unwrap();
    let product_id = product.id.unwrap().to_hex();
    seed_user(
        backend.user_repo.as_ref(),
        "alice",
        "alice@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    seed_user(
        backend.user_repo.as_ref(),
        "bob",
        "bob@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;

    let alice = login_token(&backend.router, "alice@example.com", "password123").await;
    let bob = login_token(&backend.router, "bob@example.com", "password123").await;

    backend
        .router
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/orders",
            &alice,
            &order_body(&product_id, 1, 2.5),
        ))
        .await
        .unwrap();
    backend
        .router
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/orders",
            &bob,
            &order_body(&product_id, 2, 5.0),
        ))
        .await
        .unwrap();

    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("GET", "/orders/myorders", &bob))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["username"], "bob");
    assert_eq!(list[0]["total_price"], 5.0);
}
