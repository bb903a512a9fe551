pub mod cart;
pub mod checkout;
pub mod profile;
pub mod wishlist;

use axum::{middleware::from_fn_with_state, Router};

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;
use cart::cart_router;
use checkout::checkout_router;
use profile::profile_router;
use wishlist::wishlist_router;

fn user_auth(state: &AppState) -> AuthState {
    AuthState {
        db: state.db.clone(),
        role: Role::User,
        secret: state.secret.clone(),
    }
}

/// Shopper routes under the locale prefix.
pub fn user_api_router(state: AppState) -> Router {
    Router::new()
        .merge(cart_router(state.clone()))
        .merge(wishlist_router(state.clone()))
        .merge(checkout_router(state.clone()))
        .layer(from_fn_with_state(user_auth(&state), auth_middleware))
}

pub fn account_router(state: AppState) -> Router {
    Router::new()
        .merge(profile_router(state.clone()))
        .layer(from_fn_with_state(user_auth(&state), auth_middleware))
}
