//! Application error type shared by every service.
//!
//! Every failure a service can return is an [`AppError`] carrying an
//! [`ErrorKind`]. Callers branch on the kind, never on message text.
//!
//! | kind | meaning | HTTP |
//! |------|---------|------|
//! | `Validation` | malformed or inconsistent input | 422 |
//! | `NotFound` | referenced entity absent | 404 |
//! | `Conflict` | uniqueness / already-exists violation | 409 |
//! | `CapacityExceeded` | offering has no free seat | 409 |
//! | `PermissionDenied` | authenticated but not allowed | 403 |
//! | `Unauthenticated` | no acting principal | 401 |
//! | `Storage` | persistence failure, transaction rolled back | 500 |

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// Classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    CapacityExceeded,
    PermissionDenied,
    Unauthenticated,
    Storage,
}

impl ErrorKind {
    /// HTTP status a route handler should answer with.
    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict | Self::CapacityExceeded => StatusCode::CONFLICT,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Only storage failures are worth retrying with the same input.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Storage)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::PermissionDenied => "permission_denied",
            Self::Unauthenticated => "unauthenticated",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(kind: ErrorKind, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind,
            error: err.into(),
        }
    }

    pub fn validation<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Validation, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::NotFound, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Conflict, err)
    }

    pub fn capacity_exceeded<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::CapacityExceeded, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::PermissionDenied, err)
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            ErrorKind::Unauthenticated,
            anyhow::anyhow!("Authentication required"),
        )
    }

    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Storage, err)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// True for plain conflicts and for their capacity specialisation.
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, ErrorKind::Conflict | ErrorKind::CapacityExceeded)
    }

    /// Message safe to show an end user. Storage causes stay server-side.
    pub fn public_message(&self) -> String {
        match self.kind {
            ErrorKind::Storage => "The operation could not be completed, please retry".to_string(),
            _ => self.error.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.kind == ErrorKind::Storage {
            tracing::error!(error = ?self.error, "storage failure surfaced to caller");
        }

        let body = Json(json!({
            "error": self.public_message(),
            "kind": self.kind,
        }));

        (self.status(), body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::storage(err)
    }
}
