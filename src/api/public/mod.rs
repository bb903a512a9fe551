pub mod auth;
pub mod category;
pub mod product;
pub mod settings;

use axum::Router;

use crate::state::AppState;
use auth::auth_router;
use category::category_router;
use product::product_router;
use settings::settings_router;

pub fn public_api_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_router(state.clone()))
        .merge(settings_router(state))
}

/// Catalog browsing, mounted under the locale prefix.
pub fn storefront_router(state: AppState) -> Router {
    Router::new()
        .merge(product_router(state.clone()))
        .merge(category_router(state))
}
