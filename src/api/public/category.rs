use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::entities::category;
use crate::i18n::{resolve, Locale, TextField};
use crate::middleware::logging::{ok_response, to_response, ApiError};
use crate::state::AppState;

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/:slug", get(get_category))
        .layer(Extension(state))
}

async fn get_categories(
    Path(locale): Path<Locale>,
    Extension(state): Extension<AppState>,
) -> Response {
    let categories = state.catalog.categories().await;
    let response: Vec<CategoryResponse> = categories
        .iter()
        .filter(|categ| categ.active)
        .map(|categ| CategoryResponse::new(categ, locale))
        .collect();
    ok_response((StatusCode::OK, Json(response)))
}

async fn get_category(
    Path((locale, slug)): Path<(Locale, String)>,
    Extension(state): Extension<AppState>,
) -> Response {
    let categories = state.catalog.categories().await;
    match categories
        .iter()
        .find(|categ| categ.active && categ.slug == slug)
    {
        Some(categ) => ok_response((StatusCode::OK, Json(CategoryResponse::new(categ, locale)))),
        None => to_response(
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No category with {} slug was found.", slug)
                })),
            ),
            Err(ApiError::General(format!("Unknown category {slug}"))),
        ),
    }
}

#[derive(Serialize, Debug)]
struct CategoryResponse {
    id: String,
    slug: String,
    name: String,
    description: String,
    product_count: i32,
}

impl CategoryResponse {
    fn new(value: &category::Model, locale: Locale) -> CategoryResponse {
        CategoryResponse {
            id: value.id.clone(),
            slug: value.slug.clone(),
            name: resolve(value, TextField::Name, locale),
            description: resolve(value, TextField::Description, locale),
            product_count: value.product_count,
        }
    }
}
