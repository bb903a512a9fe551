use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::catalog::{ProductInput, ProductPatch};
use crate::error::StoreError;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

//ROUTERS
pub fn admin_product_router(state: AppState) -> Router {
    Router::new()
        .route("/product", get(admin_get_products).post(create_product))
        .route(
            "/product/:id",
            get(admin_get_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .layer(Extension(state))
}

//ROUTES
async fn admin_get_products(Extension(state): Extension<AppState>) -> Response {
    let products = state.catalog.products().await;
    ok_response((StatusCode::OK, Json(products.as_ref().clone())))
}

async fn admin_get_product(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Response {
    match state.catalog.get_product_by_id(&id).await {
        Some(prod) => ok_response((StatusCode::OK, Json(prod))),
        None => StoreError::NotFound(format!("No product with {} id was found.", id))
            .into_api_response(),
    }
}

async fn create_product(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProductInput>,
) -> Response {
    match state.catalog.create_product(payload).await {
        Ok(prod) => ok_response((StatusCode::CREATED, Json(prod))),
        Err(err) => err.into_api_response(),
    }
}

async fn patch_product(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProductPatch>,
) -> Response {
    match state.catalog.update_product(&id, payload).await {
        Ok(prod) => ok_response((StatusCode::OK, Json(prod))),
        Err(err) => err.into_api_response(),
    }
}

async fn delete_product(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Response {
    match state.catalog.delete_product(&id).await {
        Ok(()) => ok_response((
            StatusCode::OK,
            Json(json!({
                "message": "Resource deleted successfully."
            })),
        )),
        Err(err) => err.into_api_response(),
    }
}
