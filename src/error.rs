use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub(crate) struct FieldError {
    pub(crate) field: &'static str,
    pub(crate) message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Malformed or out-of-range input, one entry per offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub(crate) struct ValidationError(pub(crate) Vec<FieldError>);

impl ValidationError {
    pub(crate) fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub(crate) fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

/// Collects field errors across a whole request before giving up.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub(crate) fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub(crate) fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.reject(field, message);
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(self.errors))
        }
    }
}

/// Request-level failure, mapped onto an HTTP status at the handler boundary.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("missing or invalid caller identity")]
    NotAuthenticated,

    #[error("{0}")]
    NoData(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("datastore error: {0:#}")]
    Datastore(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::NoData(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Datastore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(err) => json!({ "errors": err.fields() }),
            Self::Datastore(err) => {
                tracing::error!("request failed: {err:#}");
                json!({ "error": "internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
