pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod entities;
pub mod error;
pub mod guard;
pub mod i18n;
pub mod ids;
pub mod middleware;
pub mod payment;
pub mod settings;
pub mod state;
pub mod wishlist;

use axum::{middleware::from_fn, Router};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

use crate::api::create_api_router;
use crate::middleware::logging::logging_middleware;

pub fn create_app(state: AppState) -> Router {
    create_api_router(state)
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
