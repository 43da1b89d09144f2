use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated user's ID, set by the auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's email, set by the auth gateway
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Identity forwarded by the upstream auth gateway.
///
/// The service never validates credentials itself; the gateway strips and
/// re-sets these headers on every proxied request. Requests missing either
/// header, or with an unparseable user ID, are rejected with 401 before any
/// handler logic runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(AppError::Unauthorized)?;

        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned)
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser { id, email })
    }
}
