//! Authentication middleware
//!
//! Resolves the bearer token on a request into an [`AuthUser`]. A request
//! either has no usable token (rejected before any verification), or carries
//! one that verifies (handler runs) or does not (rejected). Rejections are
//! 401 and never say why verification failed.

use crate::api::handlers::AppState;
use crate::auth::jwt::{Claims, TokenService};
use crate::core::error::{Result, ShopError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

const NOT_AUTHENTICATED: &str = "Not authenticated";
const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Identity decoded from a verified access token.
///
/// Lives in request extensions for the duration of one request. It is not
/// re-checked against the user store, so it outlives account deletion until
/// the token expires.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            email: claims.email().map(str::to_string),
            claims,
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Resolve request headers into an authenticated identity
pub fn resolve_identity(
    headers: &HeaderMap,
    tokens: &TokenService,
    now: DateTime<Utc>,
) -> Result<AuthUser> {
    let token = bearer_token(headers)
        .ok_or_else(|| ShopError::AuthenticationError(NOT_AUTHENTICATED.to_string()))?;

    match tokens.verify(token, now) {
        Ok(claims) => Ok(AuthUser::from(claims)),
        Err(reason) => {
            tracing::warn!(reason = %reason, "Rejected access token");
            Err(ShopError::AuthenticationError(INVALID_CREDENTIALS.to_string()))
        }
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match resolve_identity(request.headers(), &state.tokens, Utc::now()) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(user_id = %user.id, "Request authenticated");
    request.extensions_mut().insert(user);

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ShopError::AuthenticationError(NOT_AUTHENTICATED.to_string()))
    }
}
