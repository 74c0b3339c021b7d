//! Request identity extractors.
//!
//! Authentication happens upstream. A gateway forwards the authenticated
//! user as `X-User-Id: <uuid>`; requests without it are anonymous.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use geofind_core::{defaults, CurrentUser};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// The caller's identity, if any.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn user(&self) -> Option<&CurrentUser> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(MaybeUser(None));
        };
        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest("X-User-Id is not valid text".to_string()))?;
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| ApiError::BadRequest(format!("X-User-Id is not a UUID: {raw}")))?;
        Ok(MaybeUser(Some(CurrentUser::new(id))))
    }
}

/// Selection session key from `X-Session-Id`, or the shared default session.
#[derive(Debug, Clone)]
pub struct SessionKey(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults::DEFAULT_SESSION);
        Ok(SessionKey(session.to_string()))
    }
}
