mod common;

use common::{bearer, spawn_app};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;

    // Step 1: Register a new user
    let response = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "username": "somchai", "password": "Secret1234" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    // Step 2: Log in and check the returned role
    let response = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": "somchai", "password": "Secret1234" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse login response JSON");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_short_passwords() {
    let app = spawn_app().await;
    app.user_token("malee").await;

    let response = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "username": "malee", "password": "Another1234" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "username": "kanya", "password": "short" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;
    app.user_token("niran").await;

    let response = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": "niran", "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse login response JSON");
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = spawn_app().await;

    let (status, _) = app.get_json("/api/th/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_json("/api/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_json("/api/th/cart", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_roles_do_not_cross() {
    let app = spawn_app().await;
    let user = app.user_token("prasert").await;
    let admin = app.admin_token().await;

    // A shopper cannot reach the admin API
    let (status, _) = app.get_json("/api/admin/product", Some(&user)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // and the admin has no cart
    let (status, _) = app.get_json("/api/en/cart", Some(&admin)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_json("/api/admin/product", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_and_password_change() {
    let app = spawn_app().await;
    let token = app.user_token("wichai").await;

    let (status, body) = app.get_json("/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "wichai");
    assert_eq!(body["cart_count"], 0);
    assert_eq!(body["wishlist_count"], 0);

    let response = app
        .client
        .patch(app.url("/api/profile"))
        .headers(bearer(&token))
        .json(&json!({ "current_password": "wrong-one", "new_password": "Changed1234" }))
        .send()
        .await
        .expect("Failed to send profile request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .patch(app.url("/api/profile"))
        .headers(bearer(&token))
        .json(&json!({ "current_password": "Secret1234", "new_password": "Changed1234" }))
        .send()
        .await
        .expect("Failed to send profile request");
    assert_eq!(response.status(), StatusCode::OK);

    app.login("wichai", "Changed1234").await;
}
