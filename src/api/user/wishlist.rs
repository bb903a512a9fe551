use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::api::public::product::PublicProductResponse;
use crate::error::StoreError;
use crate::i18n::Locale;
use crate::middleware::auth::Claims;
use crate::middleware::logging::ok_response;
use crate::state::AppState;

pub fn wishlist_router(state: AppState) -> Router {
    Router::new()
        .route("/wishlist", get(get_wishlist))
        .route(
            "/wishlist/:product_id",
            get(get_membership).put(add_entry).delete(remove_entry),
        )
        .route("/wishlist/:product_id/toggle", post(toggle_entry))
        .layer(Extension(state))
}

async fn get_wishlist(
    Path(locale): Path<Locale>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let items = match state.wishlists.items(claims.user_id).await {
        Ok(items) => items,
        Err(err) => return err.into_api_response(),
    };
    let products = state.catalog.products().await;
    // products deleted since they were wished for are left out of the listing
    let listed: Vec<PublicProductResponse> = products
        .iter()
        .filter(|prod| prod.published && items.contains(&prod.id))
        .map(|prod| PublicProductResponse::new(prod, locale))
        .collect();
    let mut ids: Vec<&String> = items.iter().collect();
    ids.sort();

    ok_response((
        StatusCode::OK,
        Json(json!({
            "items": ids,
            "count": items.len(),
            "products": listed,
        })),
    ))
}

async fn get_membership(
    Path((_locale, product_id)): Path<(Locale, String)>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.wishlists.is_in_wishlist(claims.user_id, &product_id).await {
        Ok(present) => ok_response((
            StatusCode::OK,
            Json(json!({ "product_id": product_id, "in_wishlist": present })),
        )),
        Err(err) => err.into_api_response(),
    }
}

async fn add_entry(
    Path((_locale, product_id)): Path<(Locale, String)>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if state.catalog.get_product_by_id(&product_id).await.is_none() {
        return StoreError::NotFound(format!("No product with {product_id} id was found"))
            .into_api_response();
    }
    match state.wishlists.add(claims.user_id, &product_id).await {
        Ok(()) => membership_changed(&state, claims.user_id, product_id, true).await,
        Err(err) => err.into_api_response(),
    }
}

async fn remove_entry(
    Path((_locale, product_id)): Path<(Locale, String)>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match state.wishlists.remove(claims.user_id, &product_id).await {
        Ok(()) => membership_changed(&state, claims.user_id, product_id, false).await,
        Err(err) => err.into_api_response(),
    }
}

async fn toggle_entry(
    Path((_locale, product_id)): Path<(Locale, String)>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if state.catalog.get_product_by_id(&product_id).await.is_none() {
        return StoreError::NotFound(format!("No product with {product_id} id was found"))
            .into_api_response();
    }
    match state.wishlists.toggle(claims.user_id, &product_id).await {
        Ok(present) => membership_changed(&state, claims.user_id, product_id, present).await,
        Err(err) => err.into_api_response(),
    }
}

async fn membership_changed(
    state: &AppState,
    user_id: i32,
    product_id: String,
    present: bool,
) -> Response {
    match state.wishlists.get_wishlist_count(user_id).await {
        Ok(count) => ok_response((
            StatusCode::OK,
            Json(json!({
                "product_id": product_id,
                "in_wishlist": present,
                "count": count,
            })),
        )),
        Err(err) => err.into_api_response(),
    }
}
