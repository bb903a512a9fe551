use axum::{extract::Extension, http::StatusCode, response::Response, routing::get, Json, Router};
use serde_json::json;

use crate::i18n::Locale;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

pub fn settings_router(state: AppState) -> Router {
    Router::new()
        .route("/settings", get(get_settings))
        .layer(Extension(state))
}

async fn get_settings(Extension(state): Extension<AppState>) -> Response {
    let settings = state.settings.get().await;
    ok_response((
        StatusCode::OK,
        Json(json!({
            "store_name": settings.store_name,
            "currency": settings.currency,
            "shipping_fee": settings.shipping_fee,
            "free_shipping_threshold": settings.free_shipping_threshold,
            "locales": Locale::ALL,
            "default_locale": Locale::default(),
        })),
    ))
}
