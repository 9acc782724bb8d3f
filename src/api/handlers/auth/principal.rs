//! Request authentication: bearer extraction, token checks, role gates.

use crate::api::handlers::auth::{
    error::AuthError,
    state::AuthState,
    storage::{self, User},
    types::Role,
};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use sqlx::PgPool;

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolve the caller behind a bearer token, in a fixed order: header
/// present, signature and expiry valid, subject present, token not revoked,
/// user still exists. Each failure keeps its own message so clients can tell
/// a stale token from a revoked one.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<User, AuthError> {
    let Some(bearer) = extract_bearer_token(headers) else {
        return Err(AuthError::Unauthorized("Missing authorization header"));
    };

    let Ok(claims) = state.keys().decode(&bearer) else {
        return Err(AuthError::Unauthorized("Could not validate token"));
    };

    let Some(subject) = claims.sub else {
        return Err(AuthError::Unauthorized("Invalid token"));
    };

    if let Some(jti) = &claims.jti {
        if storage::is_token_revoked(pool, jti).await? {
            return Err(AuthError::Unauthorized("Token revoked"));
        }
    }

    let Some(user) = storage::user_by_email(pool, &subject).await? else {
        return Err(AuthError::Unauthorized("User not found"));
    };

    Ok(user)
}

/// Gate a handler on the caller's role. Roles outside the known set are
/// rejected, so a stale row never widens access.
pub(crate) fn require_role(user: &User, allowed: &[Role]) -> Result<(), AuthError> {
    let Some(role) = Role::parse(&user.role) else {
        return Err(AuthError::Forbidden("Insufficient privileges"));
    };

    if allowed.contains(&role) {
        return Ok(());
    }

    Err(AuthError::Forbidden("Insufficient privileges"))
}
