mod common;

use axum::http::StatusCode;
use common::*;
use farmnest_backend::model::user::UserRole;
use farmnest_backend::repository::product_repo::ProductRepository;
use serde_json::json;
use tower::ServiceExt; // for .oneshot()

async fn admin_token(backend: &TestBackend) -> String {
    seed_user(
        backend.user_repo.as_ref(),
        "root",
        "admin@example.com",
        "changeme123",
        UserRole::Admin,
        true,
    )
    .await;
    login_token(&backend.router, "admin@example.com", "changeme123").await
}

#[tokio::test]
async fn test_list_products_is_public() {
    let backend = test_backend();
    backend
        .product_repo
        .create(test_product("Tomatoes", 2.5, 10))
        .await
        .unwrap();

    let resp = backend
        .router
        .clone()
        .oneshot(bare_request("GET", "/products"))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().expect("expected an array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Tomatoes");
    assert_eq!(list[0]["count_in_stock"], 10);
}

#[tokio::test]
async fn test_search_by_keyword() {
    let backend = test_backend();
    backend
        .product_repo
        .create(test_product("Cherry Tomatoes", 3.0, 5))
        .await
        .unwrap();
    backend
        .product_repo
        .create(test_product("Potatoes", 1.2, 20))
        .await
        .unwrap();

    let resp = backend
        .router
        .clone()
        .oneshot(bare_request("GET", "/products?keyword=tomato"))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Cherry Tomatoes");
}

#[tokio::test]
async fn test_get_product_by_id() {
    let backend = test_backend();
    let created = backend
        .product_repo
        .create(test_product("Honey", 8.0, 3))
        .await
        .unwrap();
    let id = created.id.unwrap().to_hex();

    let resp = backend
        .router
        .clone()
        .oneshot(bare_request("GET", &format!("/products/{}", id)))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["_id"]["$oid"], id);
    assert_eq!(json["name"], "Honey");
}

#[tokio::test]
async fn test_get_product_malformed_id_answers_not_found() {
    let backend = test_backend();

    let resp = backend
        .router
        .clone()
        .oneshot(bare_request("GET", "/products/not-a-hex-id"))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Product not found");
}

#[tokio::test]
async fn test_get_product_unknown_id_answers_not_found() {
    let backend = test_backend();

    let resp = backend
        .router
        .clone()
        .oneshot(bare_request("GET", "/products/64b0c8f2a1b2c3d4e5f60708"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_requires_token() {
    let backend = test_backend();

    let body = json!({
        "name": "Eggs",
        "description": "Free range eggs",
        "category": "dairy",
        "price": 4.5,
        "countInStock": 12
    });
    let resp = backend
        .router
        .clone()
        .oneshot(json_request("POST", "/products", &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Not authorized, no token");
}

#[tokio::test]
async fn test_create_product_rejects_customer() {
    let backend = test_backend();
    seed_user(
        backend.user_repo.as_ref(),
        "bob",
        "bob@example.com",
        "password123",
        UserRole::Customer,
        true,
    )
    .await;
    let token = login_token(&backend.router, "bob@example.com", "password123").await;

    let body = json!({
        "name": "Eggs",
        "description": "Free range eggs",
        "category": "dairy",
        "price": 4.5,
        "countInStock": 12
    });
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/products", &token, &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Not authorized as admin");
}

#[tokio::test]
async fn test_admin_creates_product() {
    let backend = test_backend();
    let token = admin_token(&backend).await;

    let body = json!({
        "name": "Eggs",
        "description": "Free range eggs",
        "category": "dairy",
        "price": 4.5,
        "countInStock": 12
    });
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/products", &token, &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "Eggs");
    assert_eq!(json["count_in_stock"], 12);
    assert_eq!(json["rating"], 0.0);
    assert!(json["_id"]["$oid"].as_str().is_some());
}

#[tokio::test]
async fn test_create_duplicate_name_answers_conflict() {
    let backend = test_backend();
    let token = admin_token(&backend).await;
    backend
        .product_repo
        .create(test_product("Eggs", 4.5, 12))
        .await
        .unwrap();

    let body = json!({
        "name": "Eggs",
        "description": "Another egg listing",
        "category": "dairy",
        "price": 5.0,
        "countInStock": 6
    });
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/products", &token, &body))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Conflict");
}

#[tokio::test]
async fn test_create_product_rejects_negative_price() {
    let backend = test_backend();
    let token = admin_token(&backend).await;

    let body = json!({
        "name": "Eggs",
        "description": "Free range eggs",
        "category": "dairy",
        "price": -1.0,
        "countInStock": 12
    });
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request("POST", "/products", &token, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_updates_price_and_stock() {
    let backend = test_backend();
    let token = admin_token(&backend).await;
    let created = backend
        .product_repo
        .create(test_product("Milk", 2.0, 8))
        .await
        .unwrap();
    let id = created.id.unwrap();

    let body = json!({ "price": 2.4, "countInStock": 15 });
    let resp = backend
        .router
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            &format!("/products/{}", id.to_hex()),
            &token,
            &body,
        ))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"], 2.4);
    assert_eq!(json["count_in_stock"], 15);
    // Untouched fields keep their stored value
    assert_eq!(json["name"], "Milk");
    assert_eq!(backend.product_repo.stock_of(id), Some(15));
}

#[tokio::test]
async fn test_admin_deletes_product() {
    let backend = test_backend();
    let token = admin_token(&backend).await;
    let created = backend
        .product_repo
        .create(test_product("Milk", 2.0, 8))
        .await
        .unwrap();
    let id = created.id.unwrap().to_hex();

    let resp = backend
        .router
        .clone()
        .oneshot(authed_request("DELETE", &format!("/products/{}", id), &token))
        .await
        .unwrap();
    let (status, json) = response_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Product removed");

    let list = backend
        .router
        .clone()
        .oneshot(bare_request("GET", "/products"))
        .await
        .unwrap();
    let (_, json) = response_json(list).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}
