/// TaskHub Web - Authentication middleware.
///
/// Resolves the acting user from a bearer token or the `access_token`
/// cookie. A token that does not verify or name an active user leaves the
/// request anonymous; a store error fails the request.
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authenticated user context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

/// Rejects with 401 when the request is anonymous.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))
    }
}

/// The acting user, if any. Never rejects.
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(&jar, request.headers())
        && let Some(user) = resolve_user(&state, &token).await?
    {
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

/// `Ok(None)` for a token that does not name an active user. Store failures
/// are returned to the caller.
async fn resolve_user(state: &AppState, token: &str) -> Result<Option<AuthUser>, AppError> {
    let claims = match state.auth_service.verify_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Token verification failed");
            return Ok(None);
        }
    };
    let Ok(user_id) = claims.user_id() else {
        return Ok(None);
    };

    let user = state.store.find_user(user_id).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "User lookup failed during authentication");
        e
    })?;

    match user {
        Some(user) if user.is_active => Ok(Some(AuthUser {
            id: user.id,
            username: user.username,
        })),
        Some(_) => {
            tracing::debug!(user_id, "Token for inactive user");
            Ok(None)
        }
        None => {
            tracing::debug!(user_id, "Token for unknown user");
            Ok(None)
        }
    }
}

/// Token from `Authorization: Bearer` or the access token cookie.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
