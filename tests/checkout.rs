mod common;

use async_trait::async_trait;
use common::{
    bearer, cart_line, init_state, insert_user, shirt, spawn_app, spawn_app_with, temp_database,
    TestApp,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use storefront::cart::CartStore;
use storefront::entities::order::Status;
use storefront::payment::{FakeGateway, PaymentError, PaymentGateway, PaymentIntent};

async fn fill_cart(app: &TestApp, user: &str, product_id: &str, quantity: u32) {
    let response = app
        .client
        .post(app.url("/api/en/cart"))
        .headers(bearer(user))
        .json(&json!({
            "product_id": product_id,
            "size": "M",
            "color": "Black",
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to send add to cart request");
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn post(app: &TestApp, token: &str, path: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .client
        .post(app.url(path))
        .headers(bearer(token))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_checkout_creates_paid_order_and_empties_cart() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("nok").await;
    let product_id = app.create_product(&admin, shirt("Batik", 250.0)).await;
    fill_cart(&app, &user, &product_id, 2).await;

    // Step 1: Quote
    let (status, quote) = app.get_json("/api/en/checkout", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["item_count"], 2);
    assert_eq!(quote["subtotal"], 500.0);
    assert_eq!(quote["total"], 500.0);
    assert_eq!(quote["currency"], "thb");

    // Step 2: Start the payment
    let (status, session) = post(&app, &user, "/api/en/checkout", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = session["client_secret"]
        .as_str()
        .expect("Client secret missing")
        .to_string();
    assert!(secret.contains("_secret_"));
    assert_eq!(session["total"], 500.0);
    assert_eq!(session["amount"], 50000);

    // Step 3: Confirm
    let (status, order) = post(
        &app,
        &user,
        "/api/en/checkout/confirm",
        json!({ "client_secret": secret }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "paid");
    assert_eq!(order["total"], 500.0);
    assert_eq!(order["lines"][0]["quantity"], 2);
    assert_eq!(order["lines"][0]["unit_price"], 250.0);
    assert_eq!(order["lines"][0]["name"], "Batik");

    let (_, body) = app.get_json("/api/en/cart/count", Some(&user)).await;
    assert_eq!(body["count"], 0);

    // Step 4: Confirming again returns the same order
    let (status, again) = post(
        &app,
        &user,
        "/api/en/checkout/confirm",
        json!({ "client_secret": secret }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], order["id"]);

    let (status, orders) = app.get_json("/api/en/orders", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["id"], order["id"]);
}

#[tokio::test]
async fn test_shipping_follows_settings() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("kaew").await;

    let response = app
        .client
        .put(app.url("/api/admin/settings"))
        .headers(bearer(&admin))
        .json(&json!({
            "store_name": "Storefront",
            "currency": "thb",
            "shipping_fee": 40.0,
            "free_shipping_threshold": 500.0
        }))
        .send()
        .await
        .expect("Failed to send settings request");
    assert_eq!(response.status(), StatusCode::OK);

    let product_id = app.create_product(&admin, shirt("Sarong", 200.0)).await;
    fill_cart(&app, &user, &product_id, 1).await;
    let (_, quote) = app.get_json("/api/en/checkout", Some(&user)).await;
    assert_eq!(quote["shipping"], 40.0);
    assert_eq!(quote["total"], 240.0);

    fill_cart(&app, &user, &product_id, 2).await;
    let (_, quote) = app.get_json("/api/en/checkout", Some(&user)).await;
    assert_eq!(quote["subtotal"], 600.0);
    assert_eq!(quote["shipping"], 0.0);
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let app = spawn_app().await;
    let user = app.user_token("ploy").await;

    let (status, _) = post(&app, &user, "/api/en/checkout", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = app.get_json("/api/en/orders", Some(&user)).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_cart_change_after_checkout_started() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.user_token("tong").await;
    let product_id = app.create_product(&admin, shirt("Pha Khao Ma", 90.0)).await;
    fill_cart(&app, &user, &product_id, 1).await;

    let (_, session) = post(&app, &user, "/api/en/checkout", json!({})).await;
    let secret = session["client_secret"].as_str().unwrap_or_default().to_string();

    fill_cart(&app, &user, &product_id, 1).await;
    let (status, _) = post(
        &app,
        &user,
        "/api/en/checkout/confirm",
        json!({ "client_secret": secret }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the cart is left alone
    let (_, body) = app.get_json("/api/en/cart/count", Some(&user)).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_other_users_secret_is_rejected() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let owner = app.user_token("owner").await;
    let other = app.user_token("other").await;
    let product_id = app.create_product(&admin, shirt("Krama", 35.0)).await;
    fill_cart(&app, &owner, &product_id, 1).await;
    fill_cart(&app, &other, &product_id, 1).await;

    let (_, session) = post(&app, &owner, "/api/en/checkout", json!({})).await;
    let secret = session["client_secret"].as_str().unwrap_or_default().to_string();

    let (status, _) = post(
        &app,
        &other,
        "/api/en/checkout/confirm",
        json!({ "client_secret": secret }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get_json("/api/en/cart/count", Some(&other)).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_declined_payment_keeps_the_cart() {
    let app = spawn_app_with(Arc::new(FakeGateway::declining())).await;
    let admin = app.admin_token().await;
    let user = app.user_token("jai").await;
    let product_id = app.create_product(&admin, shirt("Longyi", 70.0)).await;
    fill_cart(&app, &user, &product_id, 1).await;

    let (status, session) = post(&app, &user, "/api/en/checkout", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = session["client_secret"].as_str().unwrap_or_default().to_string();

    let (status, body) = post(
        &app,
        &user,
        "/api/en/checkout/confirm",
        json!({ "client_secret": secret }),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].is_string());

    let (_, body) = app.get_json("/api/en/cart/count", Some(&user)).await;
    assert_eq!(body["count"], 1);
    let (_, orders) = app.get_json("/api/en/orders", Some(&user)).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_confirm_after_restart_records_the_order() {
    let (_dir, database_url) = temp_database();
    let gateway = Arc::new(FakeGateway::new());

    // Step 1: Start checkout, then drop the whole state as a restart would
    let before = init_state(&database_url, gateway.clone()).await;
    let user_id = insert_user(&before, "restart").await;
    before
        .carts
        .add_to_cart(user_id, cart_line("prod_a", "M", 2, 120.0))
        .await
        .expect("Failed to add to cart");
    let session = before
        .checkout
        .begin(user_id)
        .await
        .expect("Failed to start checkout");
    drop(before);

    // Step 2: A fresh state over the same database confirms it
    let after = init_state(&database_url, gateway).await;
    let order = after
        .checkout
        .confirm(user_id, &session.client_secret)
        .await
        .expect("Failed to confirm after restart");
    assert_eq!(order.order.status, Status::Paid);
    assert_eq!(order.order.total, 240.0);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(
        after.carts.get_cart_item_count(user_id).await.expect("count"),
        0
    );

    let orders = after.checkout.orders(user_id).await.expect("orders");
    assert_eq!(orders.len(), 1);
}

/// Adds a line to the shopper's cart while the processor is confirming.
#[derive(Debug)]
struct BusyShopperGateway {
    inner: FakeGateway,
    cart: Mutex<Option<(Arc<CartStore>, i32)>>,
}

#[async_trait]
impl PaymentGateway for BusyShopperGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.inner.create_intent(amount, currency).await
    }

    async fn confirm(&self, client_secret: &str) -> Result<String, PaymentError> {
        let cart = self.cart.lock().expect("gateway lock").take();
        if let Some((carts, user_id)) = cart {
            carts
                .add_to_cart(user_id, cart_line("prod_late", "L", 1, 10.0))
                .await
                .expect("Failed to add the late line");
        }
        self.inner.confirm(client_secret).await
    }
}

#[tokio::test]
async fn test_lines_added_during_confirm_stay_in_the_cart() {
    let (_dir, database_url) = temp_database();
    let gateway = Arc::new(BusyShopperGateway {
        inner: FakeGateway::new(),
        cart: Mutex::new(None),
    });
    let state = init_state(&database_url, gateway.clone()).await;
    let user_id = insert_user(&state, "busy").await;
    *gateway.cart.lock().expect("gateway lock") = Some((state.carts.clone(), user_id));

    state
        .carts
        .add_to_cart(user_id, cart_line("prod_a", "M", 2, 50.0))
        .await
        .expect("Failed to add to cart");
    let session = state
        .checkout
        .begin(user_id)
        .await
        .expect("Failed to start checkout");
    let order = state
        .checkout
        .confirm(user_id, &session.client_secret)
        .await
        .expect("Failed to confirm");

    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].product_id, "prod_a");

    let left = state.carts.lines(user_id).await.expect("cart lines");
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].product_id, "prod_late");
}

async fn set_status(
    app: &TestApp,
    admin: &str,
    order_id: &str,
    status: &str,
) -> (StatusCode, Value) {
    let response = app
        .client
        .patch(app.url(&format!("/api/admin/order/{}", order_id)))
        .headers(bearer(admin))
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to send status request");
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_admin_moves_orders_through_fulfilment() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let buyer = app.user_token("buyer").await;
    let browser = app.user_token("browser").await;
    let product_id = app.create_product(&admin, shirt("Pakama", 60.0)).await;

    // Step 1: One paid order and one checkout left unpaid
    fill_cart(&app, &buyer, &product_id, 1).await;
    let (_, session) = post(&app, &buyer, "/api/en/checkout", json!({})).await;
    let (status, order) = post(
        &app,
        &buyer,
        "/api/en/checkout/confirm",
        json!({ "client_secret": session["client_secret"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = order["id"].as_str().expect("Order id missing").to_string();

    fill_cart(&app, &browser, &product_id, 1).await;
    post(&app, &browser, "/api/en/checkout", json!({})).await;

    // Step 2: Admin listings
    let (status, all) = app.get_json("/api/admin/order", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(2));
    let (_, paid) = app.get_json("/api/admin/order?status=paid", Some(&admin)).await;
    assert_eq!(paid.as_array().map(Vec::len), Some(1));
    assert_eq!(paid[0]["id"], order_id.as_str());
    let (_, created) = app
        .get_json("/api/admin/order?status=created", Some(&admin))
        .await;
    assert_eq!(created.as_array().map(Vec::len), Some(1));
    let (status, _) = app.get_json("/api/admin/order?status=lost", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the unpaid checkout is not one of the shopper's orders
    let (_, mine) = app.get_json("/api/en/orders", Some(&browser)).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(0));

    // Step 3: Forward one step at a time
    let (status, _) = set_status(&app, &admin, &order_id, "delivered").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for next in ["processing", "shipped", "delivered"] {
        let (status, body) = set_status(&app, &admin, &order_id, next).await;
        assert_eq!(status, StatusCode::OK, "{}", next);
        assert_eq!(body["status"], next);
    }
    let (status, _) = set_status(&app, &admin, &order_id, "cancelled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mine) = app.get_json("/api/en/orders", Some(&buyer)).await;
    assert_eq!(mine[0]["status"], "delivered");

    // Step 4: Unknown orders and shoppers
    let (status, _) = set_status(&app, &admin, "order_missing", "processing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = set_status(&app, &buyer, &order_id, "processing").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
