#![allow(dead_code)]

use reqwest::{header, Client, StatusCode};
use sea_orm::{Database, EntityTrait, Set};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use storefront::cart::NewCartLine;
use storefront::entities::user::{self, Role};
use storefront::payment::{FakeGateway, PaymentGateway};
use storefront::{create_app, AppState, Config};

pub const ADMIN_PASSWORD: &str = "admin-password";

/// A storefront served on an ephemeral port over a throwaway SQLite file.
pub struct TestApp {
    pub base: String,
    pub client: Client,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(FakeGateway::new())).await
}

pub async fn spawn_app_with(gateway: Arc<dyn PaymentGateway>) -> TestApp {
    let (dir, database_url) = temp_database();
    let state = init_state(&database_url, gateway).await;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        base: format!("http://{}", addr),
        client: Client::new(),
        _dir: dir,
    }
}

/// A throwaway SQLite file; the database lives as long as the returned dir.
pub fn temp_database() -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let database_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("storefront.db").display()
    );
    (dir, database_url)
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        secret: "test-secret".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        stripe_secret_key: None,
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        default_currency: "thb".to_string(),
    }
}

/// Opens the database and builds the full state, as the server does on start.
pub async fn init_state(database_url: &str, gateway: Arc<dyn PaymentGateway>) -> AppState {
    let db = Database::connect(database_url)
        .await
        .expect("Failed to open database");
    AppState::init(db, &test_config(database_url), gateway)
        .await
        .expect("Failed to initialise state")
}

/// Inserts a shopper directly and returns the id.
pub async fn insert_user(state: &AppState, username: &str) -> i32 {
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        password: Set("not-a-real-hash".to_string()),
        role: Set(Role::User),
        ..Default::default()
    };
    user::Entity::insert(user)
        .exec(&*state.db)
        .await
        .expect("Failed to insert user")
        .last_insert_id
}

pub fn cart_line(product_id: &str, size: &str, quantity: u32, price: f64) -> NewCartLine {
    NewCartLine {
        product_id: product_id.to_string(),
        size: size.to_string(),
        color: "Black".to_string(),
        quantity,
        price,
        sale_price: None,
        name: product_id.to_string(),
        image: None,
    }
}

pub fn bearer(token: &str) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .expect("Failed to create Authorization header"),
    );
    headers
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(response.status(), StatusCode::OK);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse login response JSON");
        body["token"]
            .as_str()
            .expect("Token not found in login response")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    pub async fn user_token(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/register"))
            .json(&json!({ "username": username, "password": "Secret1234" }))
            .send()
            .await
            .expect("Failed to send register request");
        assert_eq!(response.status(), StatusCode::CREATED);
        self.login(username, "Secret1234").await
    }

    /// Creates a product as admin and returns its id.
    pub async fn create_product(&self, admin: &str, payload: Value) -> String {
        let response = self
            .client
            .post(self.url("/api/admin/product"))
            .headers(bearer(admin))
            .json(&payload)
            .send()
            .await
            .expect("Failed to send create product request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse create product response JSON");
        body["id"].as_str().expect("Product id missing").to_string()
    }

    pub async fn create_category(&self, admin: &str, payload: Value) -> String {
        let response = self
            .client
            .post(self.url("/api/admin/category"))
            .headers(bearer(admin))
            .json(&payload)
            .send()
            .await
            .expect("Failed to send create category request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse create category response JSON");
        body["id"].as_str().expect("Category id missing").to_string()
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.headers(bearer(token));
        }
        let response = request.send().await.expect("Failed to send request");
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }
}

/// A published shirt with one size and one color.
pub fn shirt(name_en: &str, price: f64) -> Value {
    json!({
        "name_en": name_en,
        "name_th": format!("เสื้อ {}", name_en),
        "category_en": "Shirts",
        "category_th": "เสื้อ",
        "price": price,
        "images": ["https://cdn.example.com/shirt.jpg"],
        "sizes": ["M", "L"],
        "colors": [{ "name": "Black", "hex": "#000000" }],
        "stock": 10,
        "published": true
    })
}
