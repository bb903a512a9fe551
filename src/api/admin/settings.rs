use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::{post, put},
    Json, Router,
};
use serde_json::json;

use crate::middleware::logging::ok_response;
use crate::settings::SettingsInput;
use crate::state::AppState;

pub fn admin_settings_router(state: AppState) -> Router {
    Router::new()
        .route("/settings", put(replace_settings))
        .route("/reload", post(reload_caches))
        .layer(Extension(state))
}

async fn replace_settings(
    Extension(state): Extension<AppState>,
    Json(payload): Json<SettingsInput>,
) -> Response {
    match state.settings.replace(payload).await {
        Ok(settings) => ok_response((StatusCode::OK, Json(settings))),
        Err(err) => err.into_api_response(),
    }
}

/// Drops every cached collection and reads it again from the database.
async fn reload_caches(Extension(state): Extension<AppState>) -> Response {
    let result = async {
        state.catalog.reload_products().await?;
        state.catalog.reload_categories().await?;
        state.settings.reload().await?;
        Ok::<_, crate::error::StoreError>(())
    }
    .await;

    match result {
        Ok(()) => {
            let products = state.catalog.products().await.len();
            let categories = state.catalog.categories().await.len();
            ok_response((
                StatusCode::OK,
                Json(json!({
                    "products": products,
                    "categories": categories,
                })),
            ))
        }
        Err(err) => err.into_api_response(),
    }
}
