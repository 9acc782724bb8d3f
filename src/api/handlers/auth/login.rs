//! Password login and token revocation.

use crate::api::handlers::{
    auth::{
        error::AuthError,
        password, principal,
        state::AuthState,
        storage,
        token::TOKEN_TYPE,
        types::{LoginRequest, TokenResponse},
    },
    normalize_email, valid_email,
};
use axum::{
    extract::Extension,
    http::{header::CACHE_CONTROL, HeaderMap, HeaderValue, StatusCode},
    response::Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 400, description = "Missing payload or invalid email"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<(HeaderMap, Json<TokenResponse>), AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::BadRequest("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::BadRequest("Invalid email"));
    }

    // Unknown email and wrong password are indistinguishable to the caller.
    let Some(user) = storage::user_by_email(&pool, &email).await? else {
        return Err(AuthError::Unauthorized("Invalid credentials"));
    };

    if !password::verify_blocking(request.password, user.password_hash.clone()).await? {
        return Err(AuthError::Unauthorized("Invalid credentials"));
    }

    let ttl_minutes = auth_state.config().token_ttl_minutes();
    let issued = auth_state
        .keys()
        .issue(&user.email, ttl_minutes)
        .map_err(anyhow::Error::from)?;

    debug!(jti = %issued.jti, "Issued access token for {}", user.email);

    // Bearer tokens must never land in shared caches.
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok((
        headers,
        Json(TokenResponse {
            access_token: issued.token,
            token_type: TOKEN_TYPE.to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<StatusCode, AuthError> {
    let Some(bearer) = principal::extract_bearer_token(&headers) else {
        return Err(AuthError::Unauthorized("Missing authorization header"));
    };

    let Ok(claims) = auth_state.keys().decode(&bearer) else {
        return Err(AuthError::Unauthorized("Invalid token"));
    };

    // Tokens without a jti cannot be blocklisted; they still expire on time.
    if let Some(jti) = claims.jti {
        storage::revoke_token(&pool, &jti).await?;
        info!(jti = %jti, "Token revoked");
    }

    Ok(StatusCode::NO_CONTENT)
}
