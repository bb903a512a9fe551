use axum::{extract::Extension, http::StatusCode, response::Response, routing::get, Json, Router};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::public::auth::hash_password;
use crate::entities::user::Entity as UserEntity;
use crate::error::StoreError;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ok_response, to_response, ApiError};
use crate::state::AppState;

pub fn profile_router(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(patch_profile))
        .layer(Extension(state))
}

async fn get_profile(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let user = match UserEntity::find_by_id(claims.user_id).one(&*state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            return StoreError::NotFound("Not found".into()).into_api_response();
        }
        Err(err) => return StoreError::from(err).into_api_response(),
    };
    let cart_count = state.carts.get_cart_item_count(user.id).await;
    let wishlist_count = state.wishlists.get_wishlist_count(user.id).await;

    match (cart_count, wishlist_count) {
        (Ok(cart_count), Ok(wishlist_count)) => ok_response((
            StatusCode::OK,
            Json(json!({
                "id": user.id,
                "username": user.username,
                "role": user.role,
                "cart_count": cart_count,
                "wishlist_count": wishlist_count,
            })),
        )),
        (Err(err), _) | (_, Err(err)) => err.into_api_response(),
    }
}

/// Only the password can be changed.
async fn patch_profile(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProfile>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return StoreError::from(errors).into_api_response();
    }

    let user = match UserEntity::find_by_id(claims.user_id).one(&*state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => return StoreError::NotFound("Not found".into()).into_api_response(),
        Err(err) => return StoreError::from(err).into_api_response(),
    };
    if user.check_hash(&payload.current_password).is_err() {
        return to_response(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Current password is wrong"
                })),
            ),
            Err(ApiError::General("Password change with wrong password".into())),
        );
    }

    let hash = match hash_password(&payload.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An internal server error occured"
                    })),
                ),
                Err(ApiError::PasswordHashFailed(err)),
            )
        }
    };

    let mut user = user.into_active_model();
    user.password = Set(hash);
    match user.update(&*state.db).await {
        Ok(_) => ok_response((
            StatusCode::OK,
            Json(json!({
                "message": "Password updated"
            })),
        )),
        Err(err) => StoreError::from(err).into_api_response(),
    }
}

#[derive(Deserialize, Debug, Validate)]
struct PatchProfile {
    current_password: String,
    #[validate(length(min = 8, max = 128))]
    new_password: String,
}
