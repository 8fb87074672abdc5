use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller identity resolved by upstream session middleware.
pub(crate) const USER_HEADER: &str = "x-user-id";
const MAX_USER_ID_LEN: usize = 128;

/// Opaque identifier of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallerId(String);

impl CallerId {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let id = raw.trim();
        let valid = !id.is_empty()
            && id.len() <= MAX_USER_ID_LEN
            && !id.chars().any(char::is_control);
        valid.then(|| Self(id.to_string()))
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(CallerId::parse)
            .ok_or(AppError::NotAuthenticated)
    }
}
