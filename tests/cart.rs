mod common;

use common::{bearer, cart_line, init_state, insert_user, shirt, spawn_app, temp_database, TestApp};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront::error::StoreError;
use storefront::payment::FakeGateway;

async fn add(app: &TestApp, token: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .client
        .post(app.url("/api/en/cart"))
        .headers(bearer(token))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send add to cart request");
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_same_variant_merges_into_one_line() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("somsri").await;
    let product_id = app.create_product(&admin, shirt("Linen", 100.0)).await;

    let line = json!({ "product_id": product_id, "size": "M", "color": "Black", "quantity": 1 });
    let (status, _) = add(&app, &user, line).await;
    assert_eq!(status, StatusCode::CREATED);

    let line = json!({ "product_id": product_id, "size": "M", "color": "Black", "quantity": 2 });
    let (status, body) = add(&app, &user, line).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["lines"][0]["quantity"], 3);
    assert_eq!(body["lines"][0]["name"], "Linen");
    assert_eq!(body["item_count"], 3);
    assert_eq!(body["subtotal"], 300.0);

    let (status, body) = app.get_json("/api/en/cart/count", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    // Another size is its own line
    let line = json!({ "product_id": product_id, "size": "L", "color": "Black", "quantity": 1 });
    let (_, body) = add(&app, &user, line).await;
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["item_count"], 4);
}

#[tokio::test]
async fn test_quantity_updates_clamp_to_one() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("anong").await;
    let product_id = app.create_product(&admin, shirt("Silk", 50.0)).await;

    add(
        &app,
        &user,
        json!({ "product_id": product_id, "size": "L", "color": "Black", "quantity": 5 }),
    )
    .await;

    let response = app
        .client
        .patch(app.url("/api/en/cart"))
        .headers(bearer(&user))
        .json(&json!({ "product_id": product_id, "size": "L", "color": "Black", "quantity": 0 }))
        .send()
        .await
        .expect("Failed to send patch request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse patch response JSON");
    assert_eq!(body["lines"][0]["quantity"], 1);
    assert_eq!(body["item_count"], 1);

    // A variant that is not in the cart
    let response = app
        .client
        .patch(app.url("/api/en/cart"))
        .headers(bearer(&user))
        .json(&json!({ "product_id": product_id, "size": "M", "color": "Black", "quantity": 2 }))
        .send()
        .await
        .expect("Failed to send patch request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_line() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("boon").await;
    let first = app.create_product(&admin, shirt("First", 10.0)).await;
    let second = app.create_product(&admin, shirt("Second", 20.0)).await;

    add(
        &app,
        &user,
        json!({ "product_id": first, "size": "M", "color": "Black", "quantity": 2 }),
    )
    .await;
    add(
        &app,
        &user,
        json!({ "product_id": second, "size": "M", "color": "Black", "quantity": 3 }),
    )
    .await;

    let response = app
        .client
        .delete(app.url(&format!("/api/en/cart/{}?size=M&color=Black", second)))
        .headers(bearer(&user))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse delete response JSON");
    assert_eq!(body["item_count"], 2);
    assert_eq!(body["lines"][0]["product_id"], first.as_str());

    // Removing it again changes nothing
    let response = app
        .client
        .delete(app.url(&format!("/api/en/cart/{}?size=M&color=Black", second)))
        .headers(bearer(&user))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = app.get_json("/api/en/cart/count", Some(&user)).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_invalid_lines_are_rejected() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("chai").await;
    let product_id = app.create_product(&admin, shirt("Cotton", 30.0)).await;
    let mut sold_out = shirt("Sold out", 30.0);
    sold_out["stock"] = json!(0);
    let sold_out_id = app.create_product(&admin, sold_out).await;

    let cases = [
        json!({ "product_id": product_id, "size": "XXL", "color": "Black", "quantity": 1 }),
        json!({ "product_id": product_id, "size": "M", "color": "Pink", "quantity": 1 }),
        json!({ "product_id": product_id, "size": "M", "color": "Black", "quantity": 0 }),
        json!({ "product_id": sold_out_id, "size": "M", "color": "Black", "quantity": 1 }),
    ];
    for payload in cases {
        let (status, _) = add(&app, &user, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
    }

    let (status, _) = add(
        &app,
        &user,
        json!({ "product_id": "prod_missing", "size": "M", "color": "Black", "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get_json("/api/en/cart", Some(&user)).await;
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let alice = app.user_token("alice").await;
    let bob = app.user_token("bobby").await;
    let product_id = app.create_product(&admin, shirt("Shared", 10.0)).await;

    add(
        &app,
        &alice,
        json!({ "product_id": product_id, "size": "M", "color": "Black", "quantity": 4 }),
    )
    .await;

    let (_, body) = app.get_json("/api/en/cart/count", Some(&alice)).await;
    assert_eq!(body["count"], 4);
    let (_, body) = app.get_json("/api/en/cart/count", Some(&bob)).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_clear_cart() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("mali").await;
    let product_id = app.create_product(&admin, shirt("Sabai", 15.0)).await;

    add(
        &app,
        &user,
        json!({ "product_id": product_id, "size": "M", "color": "Black", "quantity": 2 }),
    )
    .await;

    let response = app
        .client
        .delete(app.url("/api/en/cart"))
        .headers(bearer(&user))
        .send()
        .await
        .expect("Failed to send clear request");
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = app.get_json("/api/en/cart", Some(&user)).await;
    assert_eq!(body["item_count"], 0);
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_overlapping_adds_of_one_line_conflict() {
    let (_dir, database_url) = temp_database();
    let state = init_state(&database_url, Arc::new(FakeGateway::new())).await;
    let user_id = insert_user(&state, "twice").await;

    let (first, second) = tokio::join!(
        state.carts.add_to_cart(user_id, cart_line("prod_a", "M", 1, 10.0)),
        state.carts.add_to_cart(user_id, cart_line("prod_a", "M", 1, 10.0)),
    );
    let conflicts = [&first, &second]
        .into_iter()
        .filter(|result| matches!(result, Err(StoreError::InFlight(_))))
        .count();
    assert_eq!(conflicts, 1);
    assert!(first.is_ok() || second.is_ok());
    assert_eq!(state.carts.get_cart_item_count(user_id).await.expect("count"), 1);

    // the key is free again once the first add finished
    state
        .carts
        .add_to_cart(user_id, cart_line("prod_a", "M", 1, 10.0))
        .await
        .expect("Failed to add after the conflict");
    assert_eq!(state.carts.get_cart_item_count(user_id).await.expect("count"), 2);
}
