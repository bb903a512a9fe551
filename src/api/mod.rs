pub mod admin;
pub mod public;
pub mod user;

use axum::Router;

use crate::state::AppState;
use admin::admin_api_router;
use public::{public_api_router, storefront_router};
use user::{account_router, user_api_router};

/// `/api/{locale}/...` for everything shown to shoppers, `/api/...` for
/// accounts and settings, `/api/admin/...` for catalog management.
pub fn create_api_router(state: AppState) -> Router {
    let localized = Router::new()
        .merge(storefront_router(state.clone()))
        .merge(user_api_router(state.clone()));

    let unlocalized = Router::new()
        .merge(public_api_router(state.clone()))
        .merge(account_router(state.clone()));

    Router::new()
        .nest("/api/admin", admin_api_router(state))
        .nest("/api/:locale", localized)
        .nest("/api", unlocalized)
}
