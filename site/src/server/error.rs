//! HTTP error responses.
//!
//! Bridges the domain errors to JSON error bodies of the form
//! `{"code": "...", "message": "...", "details": [...]}`.

use crate::dashboard::AccessError;
use crate::status::LifecycleError;
use crate::store::StoreError;
use crate::types::ValidationError;
use crate::workflow::WorkflowError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Application error type for handlers.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    details: Vec<ValidationError>,
    /// Internal error (logged, never sent to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            details: Vec::new(),
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// 400 Bad Request
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// 401 Unauthorized
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED")
    }

    /// 403 Forbidden
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message.into(), "FORBIDDEN")
    }

    /// 404 Not Found
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND",
        )
    }

    /// 409 Conflict
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT")
    }

    /// 422 with one entry per problem
    #[must_use]
    pub fn validation(details: Vec<ValidationError>) -> Self {
        let message = details
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            details,
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
        }
    }

    /// 500 Internal Server Error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// 503 Service Unavailable
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE",
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<ValidationError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(id) => Self::not_found("Session", id),
            StoreError::CapacityExceeded { .. } => Self::conflict(err.to_string()),
            StoreError::Unavailable(_) => {
                Self::unavailable("Storage is unavailable, please retry").with_source(err)
            },
            StoreError::Corrupt(_) => Self::internal("An internal error occurred").with_source(err),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Invalid(details) => Self::validation(details),
            WorkflowError::UnknownCourse(id) => Self::not_found("Course", id),
            WorkflowError::SessionNotOpen(_) | WorkflowError::CapacityChanged { .. } => {
                Self::conflict(err.to_string())
            },
            WorkflowError::Unavailable(ref message) => {
                Self::unavailable(message.clone()).with_source(err)
            },
            WorkflowError::Runtime(_) => {
                Self::internal("An internal error occurred").with_source(err)
            },
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Forbidden => Self::forbidden(err.to_string()),
            LifecycleError::NotFound { kind, id } => Self::not_found(kind, id),
            LifecycleError::InvalidTransition { .. } => Self::conflict(err.to_string()),
            LifecycleError::UnknownStatus(_) => {
                Self::internal("An internal error occurred").with_source(err)
            },
            LifecycleError::Store(store) => store.into(),
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::SignInRequired => Self::unauthorized(err.to_string()),
            AccessError::Forbidden => Self::forbidden(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SubmissionKind;
    use crate::types::SessionId;

    #[test]
    fn display_includes_code() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn validation_lists_every_problem() {
        let err = AppError::validation(vec![
            ValidationError::MissingField { field: "name" },
            ValidationError::NoSessionSelected,
        ]);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.details.len(), 2);
        assert!(err.message.starts_with("name is required"));
    }

    #[test]
    fn capacity_is_a_conflict() {
        let err = AppError::from(StoreError::CapacityExceeded {
            session_id: SessionId::new(),
            requested: 3,
            available: 1,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn lifecycle_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(LifecycleError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        let missing = AppError::from(LifecycleError::NotFound {
            kind: SubmissionKind::Quote,
            id: uuid::Uuid::nil(),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let down = AppError::from(LifecycleError::Store(StoreError::Unavailable("x".into())));
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
