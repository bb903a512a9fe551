use crate::entities::user::{self, Entity as UserEntity, Role};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::debug;

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|header| header.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    let claims: Claims = match validate_token(&state, token).await {
        Ok(claims) => claims,
        Err(err) => {
            debug!(error = %err, "Rejected bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub role: Role,
    pub secret: Arc<str>,
}

pub fn generate_token(user_id: i32, role: Role, secret: &str) -> Result<String, AuthMiddlewareError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        user_id,
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

pub async fn validate_token(state: &AuthState, token: &str) -> Result<Claims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthMiddlewareError::TokenExpired)?;

    let claims = token_data.claims;
    let role = Role::from_str(&claims.role).map_err(|_| AuthMiddlewareError::ValidationFail)?;

    match UserEntity::find_by_id(claims.user_id)
        .filter(user::Column::Role.eq(role))
        .one(&*state.db)
        .await
    {
        Ok(Some(_)) if role == state.role => Ok(claims),
        Ok(_) => Err(AuthMiddlewareError::InvalidUserOrRole),
        Err(_) => Err(AuthMiddlewareError::InternalServerError),
    }
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Invalid user id or role")]
    InvalidUserOrRole,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}
