use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::catalog::{CategoryInput, CategoryPatch};
use crate::error::StoreError;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

pub fn admin_category_router(state: AppState) -> Router {
    Router::new()
        .route("/category", get(admin_get_categories).post(create_category))
        .route(
            "/category/:id",
            get(admin_get_category)
                .patch(patch_category)
                .delete(delete_category),
        )
        .layer(Extension(state))
}

async fn admin_get_categories(Extension(state): Extension<AppState>) -> Response {
    let categories = state.catalog.categories().await;
    ok_response((StatusCode::OK, Json(categories.as_ref().clone())))
}

async fn admin_get_category(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Response {
    match state.catalog.get_category_by_id(&id).await {
        Some(categ) => ok_response((StatusCode::OK, Json(categ))),
        None => StoreError::NotFound(format!("No category with {} id was found.", id))
            .into_api_response(),
    }
}

async fn create_category(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CategoryInput>,
) -> Response {
    match state.catalog.create_category(payload).await {
        Ok(categ) => ok_response((StatusCode::CREATED, Json(categ))),
        Err(err) => err.into_api_response(),
    }
}

async fn patch_category(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CategoryPatch>,
) -> Response {
    match state.catalog.update_category(&id, payload).await {
        Ok(categ) => ok_response((StatusCode::OK, Json(categ))),
        Err(err) => err.into_api_response(),
    }
}

async fn delete_category(
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Response {
    match state.catalog.delete_category(&id).await {
        Ok(()) => ok_response((
            StatusCode::OK,
            Json(json!({
                "message": "Resource deleted successfully."
            })),
        )),
        Err(err) => err.into_api_response(),
    }
}
