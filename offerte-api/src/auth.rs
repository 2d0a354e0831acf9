use axum::{
    extract::Extension,
    middleware,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::error::AppError;
use crate::middleware::{auth_middleware, Claims};
use crate::state::{AppState, AuthConfig};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// GET /api/auth/me
async fn me(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

/// Signs a token for `sub` with the configured secret and lifetime.
pub fn issue_token(
    auth: &AuthConfig,
    sub: &str,
    email: Option<&str>,
    role: &str,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: sub.to_owned(),
        email: email.map(str::to_owned),
        role: role.to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}
