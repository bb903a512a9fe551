pub mod category;
pub mod order;
pub mod product;
pub mod settings;

use axum::{middleware::from_fn_with_state, Router};

use category::admin_category_router;
use order::admin_order_router;
use product::admin_product_router;
use settings::admin_settings_router;

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;

pub fn admin_api_router(state: AppState) -> Router {
    let auth = AuthState {
        db: state.db.clone(),
        role: Role::Admin,
        secret: state.secret.clone(),
    };

    Router::new()
        .merge(admin_category_router(state.clone()))
        .merge(admin_order_router(state.clone()))
        .merge(admin_product_router(state.clone()))
        .merge(admin_settings_router(state))
        .layer(from_fn_with_state(auth, auth_middleware))
}
