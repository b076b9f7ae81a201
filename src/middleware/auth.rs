//! Authentication middleware
//!
//! Identity is optional at the router level: a valid bearer token attaches an
//! [`AuthenticatedUser`] to the request, anything else passes through
//! anonymous. Handlers decide whether identity is required.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{error::AppError, services::AuthService, state::AppState};

/// Authenticated user extracted from JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user wrapper (never fails)
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Resolve a bearer token into a user, if it is valid
pub fn authenticate(header: Option<&str>, secret: &str) -> Option<AuthenticatedUser> {
    let token = header?.strip_prefix("Bearer ")?;

    let claims = AuthService::verify_token(token, secret)
        .inspect_err(|e| debug!(error = ?e, "Token verification failed"))
        .ok()?;
    let id = claims.user_id().ok()?;

    Some(AuthenticatedUser {
        id,
        username: claims.username,
    })
}

/// Optional authentication middleware (doesn't fail if no token)
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(user) = authenticate(header, &state.config().jwt.secret) {
        debug!(path = %request.uri().path(), user_id = %user.id, "User authenticated");
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}
