use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fest_booking::{FlowError, ValidationErrors};
use fest_core::{ExportError, RepositoryError};
use serde_json::json;

use crate::session::SessionError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String, ValidationErrors),
    BadRequest(String),
    NotFoundError(String),
    ConflictError(String),
    UnprocessableError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, fields) = match self {
            AppError::ValidationError(msg, fields) => (StatusCode::BAD_REQUEST, msg, Some(fields)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::UnprocessableError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
        };

        let body = Json(json!({
            "error": error_message,
            "fields": fields,
        }));

        (status, body).into_response()
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        let message = err.to_string();
        match err {
            FlowError::Validation(fields) => AppError::ValidationError(message, fields),
            FlowError::AttendeeOutOfRange { .. } => AppError::NotFoundError(message),
            FlowError::InvalidTransition { .. }
            | FlowError::SavePending
            | FlowError::UploadInProgress { .. } => {
                AppError::ConflictError(message)
            }
            FlowError::Persistence(_) => AppError::InternalServerError(message),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Flow(e) => e.into(),
            SessionError::Closed => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnsupportedFormat(_) => AppError::UnprocessableError(err.to_string()),
            ExportError::Render(_) | ExportError::Io(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidKey(_) => AppError::BadRequest(err.to_string()),
            _ => AppError::InternalServerError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fest_booking::Step;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_flow_errors_map_to_status_codes() {
        let invalid = FlowError::InvalidTransition {
            from: Step::Selecting,
            event: "SUBMIT",
        };
        assert_eq!(status(invalid), StatusCode::CONFLICT);
        assert_eq!(status(FlowError::SavePending), StatusCode::CONFLICT);
        assert_eq!(status(FlowError::UploadInProgress { index: 0 }), StatusCode::CONFLICT);
        assert_eq!(
            status(FlowError::AttendeeOutOfRange { index: 4, count: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(FlowError::Validation(ValidationErrors::new())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(FlowError::Persistence("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(SessionError::Closed), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unsupported_export_is_unprocessable() {
        let err = ExportError::UnsupportedFormat(fest_booking::ExportFormat::Pdf);
        assert_eq!(status(err), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
