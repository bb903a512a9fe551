use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::error::StoreError;
use crate::i18n::Locale;
use crate::middleware::auth::Claims;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

pub fn checkout_router(state: AppState) -> Router {
    Router::new()
        .route("/checkout", get(get_quote).post(start_checkout))
        .route("/checkout/confirm", post(confirm_checkout))
        .route("/orders", get(get_orders))
        .layer(Extension(state))
}

async fn get_quote(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.checkout.quote(claims.user_id).await {
        Ok(quote) => ok_response((StatusCode::OK, Json(quote))),
        Err(err) => err.into_api_response(),
    }
}

async fn start_checkout(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.checkout.begin(claims.user_id).await {
        Ok(session) => ok_response((StatusCode::CREATED, Json(session))),
        Err(err) => err.into_api_response(),
    }
}

async fn confirm_checkout(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ConfirmPayment>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return StoreError::from(errors).into_api_response();
    }
    match state
        .checkout
        .confirm(claims.user_id, &payload.client_secret)
        .await
    {
        Ok(order) => ok_response((StatusCode::OK, Json(order))),
        Err(err) => err.into_api_response(),
    }
}

async fn get_orders(
    Path(_locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.checkout.orders(claims.user_id).await {
        Ok(orders) => ok_response((StatusCode::OK, Json(orders))),
        Err(err) => err.into_api_response(),
    }
}

#[derive(Deserialize, Debug, Validate)]
struct ConfirmPayment {
    #[validate(length(min = 1))]
    client_secret: String,
}
