use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::cart::{item_count, subtotal, NewCartLine};
use crate::entities::{cart, product};
use crate::error::StoreError;
use crate::i18n::{resolve, Locale, TextField};
use crate::middleware::auth::Claims;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

//ROUTERS
pub fn cart_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/cart",
            get(get_cart)
                .post(add_product)
                .patch(patch_entry)
                .delete(clear_cart),
        )
        .route("/cart/count", get(get_count))
        .route("/cart/:product_id", delete(remove_product))
        .layer(Extension(state))
}

async fn get_cart(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.carts.lines(claims.user_id).await {
        Ok(lines) => ok_response((StatusCode::OK, Json(CartResponse::new(&lines)))),
        Err(err) => err.into_api_response(),
    }
}

async fn get_count(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.carts.get_cart_item_count(claims.user_id).await {
        Ok(count) => ok_response((StatusCode::OK, Json(json!({ "count": count })))),
        Err(err) => err.into_api_response(),
    }
}

async fn add_product(
    Path(locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddProduct>,
) -> Response {
    let product = match state.catalog.get_product_by_id(&payload.product_id).await {
        Some(product) if product.published => product,
        _ => {
            return StoreError::NotFound(format!(
                "No product with {} id was found",
                payload.product_id
            ))
            .into_api_response()
        }
    };
    let line = match payload.into_line(&product, locale) {
        Ok(line) => line,
        Err(err) => return err.into_api_response(),
    };

    match state.carts.add_to_cart(claims.user_id, line).await {
        Ok(lines) => ok_response((StatusCode::CREATED, Json(CartResponse::new(&lines)))),
        Err(err) => err.into_api_response(),
    }
}

async fn patch_entry(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchCart>,
) -> Response {
    let result = state
        .carts
        .update_quantity(
            claims.user_id,
            &payload.product_id,
            &payload.size,
            &payload.color,
            payload.quantity,
        )
        .await;
    match result {
        Ok(lines) => ok_response((StatusCode::OK, Json(CartResponse::new(&lines)))),
        Err(err) => err.into_api_response(),
    }
}

async fn clear_cart(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.carts.clear(claims.user_id).await {
        Ok(()) => ok_response((StatusCode::OK, Json(json!({ "count": 0 })))),
        Err(err) => err.into_api_response(),
    }
}

async fn remove_product(
    Path((_locale, product_id)): Path<(Locale, String)>,
    Query(variant): Query<Variant>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let result = state
        .carts
        .remove_from_cart(claims.user_id, &product_id, &variant.size, &variant.color)
        .await;
    match result {
        Ok(lines) => ok_response((StatusCode::OK, Json(CartResponse::new(&lines)))),
        Err(err) => err.into_api_response(),
    }
}

//Structs
#[derive(Deserialize, Debug)]
struct AddProduct {
    product_id: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    color: String,
    quantity: u32,
}

impl AddProduct {
    /// Checks the chosen variant against the product and snapshots it.
    fn into_line(self, product: &product::Model, locale: Locale) -> Result<NewCartLine, StoreError> {
        if self.quantity < 1 {
            return Err(StoreError::Validation(
                "Quantity should be greater than 0".into(),
            ));
        }
        if product.stock <= 0 {
            return Err(StoreError::Validation(format!(
                "Product {} is out of stock",
                product.id
            )));
        }
        if !product.sizes.0.is_empty() && !product.sizes.0.contains(&self.size) {
            return Err(StoreError::Validation(format!(
                "Size {:?} is not offered for this product",
                self.size
            )));
        }
        if !product.colors.0.is_empty() && !product.colors.0.iter().any(|c| c.name == self.color) {
            return Err(StoreError::Validation(format!(
                "Color {:?} is not offered for this product",
                self.color
            )));
        }

        Ok(NewCartLine {
            product_id: self.product_id,
            size: self.size,
            color: self.color,
            quantity: self.quantity,
            price: product.price,
            sale_price: product.sale_price,
            name: resolve(product, TextField::Name, locale),
            image: product.first_image().map(String::from),
        })
    }
}

#[derive(Deserialize, Debug)]
struct PatchCart {
    product_id: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    color: String,
    quantity: i64,
}

#[derive(Deserialize, Debug)]
struct Variant {
    #[serde(default)]
    size: String,
    #[serde(default)]
    color: String,
}

#[derive(Serialize, Debug)]
struct CartResponse {
    lines: Vec<cart::Model>,
    item_count: u64,
    subtotal: f64,
}

impl CartResponse {
    fn new(lines: &Arc<Vec<cart::Model>>) -> CartResponse {
        CartResponse {
            lines: lines.as_ref().clone(),
            item_count: item_count(lines),
            subtotal: subtotal(lines),
        }
    }
}
