use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::middleware::auth::generate_token;
use crate::middleware::logging::{ok_response, to_response, ApiError};
use crate::state::AppState;

pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .layer(Extension(state))
}

async fn register_user(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateUser>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": errors.to_string()
                })),
            ),
            Err(ApiError::ValidationFail(errors.to_string())),
        );
    }

    let password = match hash_password(&payload.password) {
        Ok(password) => password,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An internal server error occured"
                    })),
                ),
                Err(ApiError::PasswordHashFailed(err)),
            );
        }
    };

    let new_user = user::ActiveModel {
        username: Set(payload.username.clone()),
        password: Set(password),
        role: Set(Role::User),
        ..Default::default()
    };

    match UserEntity::insert(new_user).exec(&*state.db).await {
        Ok(_) => {
            info!(username = %payload.username, "Registered user");
            ok_response((
                StatusCode::CREATED,
                Json(json!({
                    "message": "User registered successfully"
                })),
            ))
        }
        Err(err) => to_response(
            (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "Username already exists"
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<UserLogin>,
) -> Response {
    let result = UserEntity::find()
        .filter(user::Column::Username.eq(&*payload.username))
        .one(&*state.db)
        .await;

    let invalid = || {
        to_response(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Invalid username or password"
                })),
            ),
            Err(ApiError::General("Invalid username or password".into())),
        )
    };

    match result {
        Ok(Some(model)) => match model.check_hash(&payload.password) {
            Ok(()) => match generate_token(model.id, model.role, &state.secret) {
                Ok(token) => ok_response((
                    StatusCode::OK,
                    Json(json!({
                        "token": token,
                        "role": model.role,
                    })),
                )),
                Err(err) => to_response(
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Internal server error"
                        })),
                    ),
                    Err(ApiError::TokenGenerationFailed(err.to_string())),
                ),
            },
            Err(_) => invalid(),
        },
        Ok(None) => invalid(),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "An internal server error occured"
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| err.to_string())
}

#[derive(Deserialize, Debug, Clone, Validate)]
struct CreateUser {
    #[validate(length(min = 3, max = 32))]
    username: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
}

#[derive(Deserialize, Clone)]
struct UserLogin {
    username: String,
    password: String,
}
