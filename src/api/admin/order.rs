use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::entities::order::Status;
use crate::error::StoreError;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

pub fn admin_order_router(state: AppState) -> Router {
    Router::new()
        .route("/order", get(admin_get_orders))
        .route("/order/:id", patch(patch_order_status))
        .layer(Extension(state))
}

async fn admin_get_orders(
    Query(params): Query<OrderQuery>,
    Extension(state): Extension<AppState>,
) -> Response {
    let status = match params.status.as_deref().map(str::parse::<Status>) {
        Some(Ok(status)) => Some(status),
        Some(Err(err)) => return StoreError::Validation(err).into_api_response(),
        None => None,
    };
    match state.checkout.all_orders(status).await {
        Ok(orders) => ok_response((StatusCode::OK, Json(orders))),
        Err(err) => err.into_api_response(),
    }
}

async fn patch_order_status(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<PatchStatus>,
) -> Response {
    match state.checkout.set_status(&id, payload.status).await {
        Ok(order) => ok_response((StatusCode::OK, Json(order))),
        Err(err) => err.into_api_response(),
    }
}

#[derive(Deserialize, Debug)]
struct OrderQuery {
    status: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PatchStatus {
    status: Status,
}
