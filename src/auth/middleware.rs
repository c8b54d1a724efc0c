//! Access guard
//! Resolves the bearer token to an identity and enforces a role allow-list

use crate::auth::{
    jwt::JwtHandler,
    models::{Identity, RoleSet},
};
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    /// No token, or an Authorization header that cannot be read
    #[error("no access token")]
    Unauthenticated,
    /// Signature, shape or expiry check failed
    #[error("invalid or expired token")]
    InvalidToken,
    /// Valid identity whose role is not allowed here
    #[error("role not permitted")]
    Forbidden,
}

/// Pull the token out of `Authorization: Bearer <token>`.
/// A bare token without the scheme is accepted as well.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        None => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Evaluate the guard once for a request
pub fn authorize(
    jwt: &JwtHandler,
    headers: &HeaderMap,
    allowed: RoleSet,
) -> Result<Identity, GuardError> {
    let token = bearer_token(headers).ok_or(GuardError::Unauthenticated)?;

    let claims = jwt.verify(token).map_err(|e| {
        debug!(reason = %e, "Rejected access token");
        GuardError::InvalidToken
    })?;

    if !allowed.permits(claims.role) {
        debug!(account_id = claims.id, role = %claims.role, "Role not permitted");
        return Err(GuardError::Forbidden);
    }

    Ok(claims.into())
}

/// Guard configuration for one group of routes
#[derive(Clone)]
pub struct AccessGuard {
    jwt: Arc<JwtHandler>,
    allowed: RoleSet,
}

impl AccessGuard {
    pub fn new(jwt: Arc<JwtHandler>, allowed: RoleSet) -> Self {
        Self { jwt, allowed }
    }
}

/// Middleware: reject the request or attach the caller's [`Identity`]
pub async fn access_guard(
    State(guard): State<AccessGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authorize(&guard.jwt, req.headers(), guard.allowed)?;

    // Handlers read it with `Extension<Identity>`
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
