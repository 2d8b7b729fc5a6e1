//! Canonical error taxonomy shared by the HTTP and gRPC surfaces.
//!
//! Every service error is collapsed into one [`AppError`] whose [`ErrorKind`]
//! decides both renderings:
//!
//! | ErrorKind | gRPC Code | HTTP |
//! |-----------|-----------|------|
//! | `InvalidArgument` | `INVALID_ARGUMENT` | 400 |
//! | `Unauthenticated` | `UNAUTHENTICATED` | 401 |
//! | `PermissionDenied` | `PERMISSION_DENIED` | 403 |
//! | `NotFound` | `NOT_FOUND` | 404 |
//! | `AlreadyExists` | `ALREADY_EXISTS` | 409 |
//! | `FailedPrecondition` | `FAILED_PRECONDITION` | 412 |
//! | `ResourceExhausted` | `RESOURCE_EXHAUSTED` | 429 |
//! | `Canceled` | `CANCELLED` | 499 |
//! | `Internal` | `INTERNAL` | 500 |
//! | `Unimplemented` | `UNIMPLEMENTED` | 501 |
//! | `Unavailable` | `UNAVAILABLE` | 502 |
//! | `DeadlineExceeded` | `DEADLINE_EXCEEDED` | 504 |
//! | `Unknown` | `UNKNOWN` | 500 (`unknown error code`) |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tonic::{Code, Status};

/// Non-standard "client closed request" status.
pub const STATUS_CLIENT_CLOSED_REQUEST: u16 = 499;

/// Message used when a code has no HTTP mapping.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error code";

/// Protocol-agnostic error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    FailedPrecondition,
    ResourceExhausted,
    Canceled,
    DeadlineExceeded,
    Internal,
    Unimplemented,
    Unavailable,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 13] = [
        ErrorKind::InvalidArgument,
        ErrorKind::Unauthenticated,
        ErrorKind::PermissionDenied,
        ErrorKind::NotFound,
        ErrorKind::AlreadyExists,
        ErrorKind::FailedPrecondition,
        ErrorKind::ResourceExhausted,
        ErrorKind::Canceled,
        ErrorKind::DeadlineExceeded,
        ErrorKind::Internal,
        ErrorKind::Unimplemented,
        ErrorKind::Unavailable,
        ErrorKind::Unknown,
    ];

    /// The gRPC code for this kind.
    pub fn code(self) -> Code {
        match self {
            ErrorKind::InvalidArgument => Code::InvalidArgument,
            ErrorKind::Unauthenticated => Code::Unauthenticated,
            ErrorKind::PermissionDenied => Code::PermissionDenied,
            ErrorKind::NotFound => Code::NotFound,
            ErrorKind::AlreadyExists => Code::AlreadyExists,
            ErrorKind::FailedPrecondition => Code::FailedPrecondition,
            ErrorKind::ResourceExhausted => Code::ResourceExhausted,
            ErrorKind::Canceled => Code::Cancelled,
            ErrorKind::DeadlineExceeded => Code::DeadlineExceeded,
            ErrorKind::Internal => Code::Internal,
            ErrorKind::Unimplemented => Code::Unimplemented,
            ErrorKind::Unavailable => Code::Unavailable,
            ErrorKind::Unknown => Code::Unknown,
        }
    }

    /// Label used for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::FailedPrecondition => "failed_precondition",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::Canceled => "canceled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Internal => "internal",
            ErrorKind::Unimplemented => "unimplemented",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl From<Code> for ErrorKind {
    fn from(code: Code) -> Self {
        match code {
            Code::InvalidArgument | Code::OutOfRange => ErrorKind::InvalidArgument,
            Code::Unauthenticated => ErrorKind::Unauthenticated,
            Code::PermissionDenied => ErrorKind::PermissionDenied,
            Code::NotFound => ErrorKind::NotFound,
            Code::AlreadyExists | Code::Aborted => ErrorKind::AlreadyExists,
            Code::FailedPrecondition => ErrorKind::FailedPrecondition,
            Code::ResourceExhausted => ErrorKind::ResourceExhausted,
            Code::Cancelled => ErrorKind::Canceled,
            Code::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Code::Internal | Code::DataLoss => ErrorKind::Internal,
            Code::Unimplemented => ErrorKind::Unimplemented,
            Code::Unavailable => ErrorKind::Unavailable,
            Code::Ok | Code::Unknown => ErrorKind::Unknown,
        }
    }
}

/// HTTP status for a gRPC code, or `None` when the code has no mapping.
pub fn http_status(code: Code) -> Option<StatusCode> {
    let status = match code {
        Code::InvalidArgument | Code::OutOfRange => StatusCode::BAD_REQUEST,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
        Code::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::Cancelled => StatusCode::from_u16(STATUS_CLIENT_CLOSED_REQUEST).ok()?,
        Code::Internal | Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::BAD_GATEWAY,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::Ok | Code::Unknown => return None,
    };
    Some(status)
}

/// Short phrase for a status, including the non-standard 499.
pub fn status_text(status: StatusCode) -> &'static str {
    if status.as_u16() == STATUS_CLIENT_CLOSED_REQUEST {
        return "Client Closed Request";
    }
    status.canonical_reason().unwrap_or(UNKNOWN_ERROR_MESSAGE)
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("canceled: {0}")]
    Canceled(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("internal: {0}")]
    Internal(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("unknown: {0}")]
    Unknown(String),

    /// An error that already carries an RPC status. Never reclassified.
    #[error("{}", .0.message())]
    Status(Status),
}

impl AppError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match kind {
            ErrorKind::InvalidArgument => AppError::InvalidArgument(detail),
            ErrorKind::Unauthenticated => AppError::Unauthenticated(detail),
            ErrorKind::PermissionDenied => AppError::PermissionDenied(detail),
            ErrorKind::NotFound => AppError::NotFound(detail),
            ErrorKind::AlreadyExists => AppError::AlreadyExists(detail),
            ErrorKind::FailedPrecondition => AppError::FailedPrecondition(detail),
            ErrorKind::ResourceExhausted => AppError::ResourceExhausted(detail),
            ErrorKind::Canceled => AppError::Canceled(detail),
            ErrorKind::DeadlineExceeded => AppError::DeadlineExceeded(detail),
            ErrorKind::Internal => AppError::Internal(detail),
            ErrorKind::Unimplemented => AppError::Unimplemented(detail),
            ErrorKind::Unavailable => AppError::Unavailable(detail),
            ErrorKind::Unknown => AppError::Unknown(detail),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AppError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            AppError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            AppError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            AppError::Canceled(_) => ErrorKind::Canceled,
            AppError::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
            AppError::Internal(_) => ErrorKind::Internal,
            AppError::Unimplemented(_) => ErrorKind::Unimplemented,
            AppError::Unavailable(_) => ErrorKind::Unavailable,
            AppError::Unknown(_) => ErrorKind::Unknown,
            AppError::Status(status) => status.code().into(),
        }
    }

    /// The gRPC code, taken verbatim from a wrapped status.
    pub fn code(&self) -> Code {
        match self {
            AppError::Status(status) => status.code(),
            other => other.kind().code(),
        }
    }

    /// The underlying error message.
    pub fn detail(&self) -> &str {
        match self {
            AppError::InvalidArgument(d)
            | AppError::Unauthenticated(d)
            | AppError::PermissionDenied(d)
            | AppError::NotFound(d)
            | AppError::AlreadyExists(d)
            | AppError::FailedPrecondition(d)
            | AppError::ResourceExhausted(d)
            | AppError::Canceled(d)
            | AppError::DeadlineExceeded(d)
            | AppError::Internal(d)
            | AppError::Unimplemented(d)
            | AppError::Unavailable(d)
            | AppError::Unknown(d) => d,
            AppError::Status(status) => status.message(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Internal(format!("configuration error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub detail: String,
}

impl ErrorResponse {
    /// Render an error into its HTTP status and envelope.
    pub fn from_error(err: &AppError) -> (StatusCode, Self) {
        let detail = err.detail().to_string();
        match http_status(err.code()) {
            Some(status) => (
                status,
                Self {
                    status: status.as_u16(),
                    message: status_text(status).to_string(),
                    detail,
                },
            ),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    message: UNKNOWN_ERROR_MESSAGE.to_string(),
                    detail,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = ErrorResponse::from_error(&self);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_table() {
        let expected = [
            (ErrorKind::InvalidArgument, 400),
            (ErrorKind::Unauthenticated, 401),
            (ErrorKind::PermissionDenied, 403),
            (ErrorKind::NotFound, 404),
            (ErrorKind::AlreadyExists, 409),
            (ErrorKind::FailedPrecondition, 412),
            (ErrorKind::ResourceExhausted, 429),
            (ErrorKind::Canceled, 499),
            (ErrorKind::Internal, 500),
            (ErrorKind::Unimplemented, 501),
            (ErrorKind::Unavailable, 502),
            (ErrorKind::DeadlineExceeded, 504),
        ];
        for (kind, status) in expected {
            let (rendered, body) = ErrorResponse::from_error(&AppError::new(kind, "boom"));
            assert_eq!(rendered.as_u16(), status, "{:?}", kind);
            assert_eq!(body.status, status);
            assert_eq!(body.detail, "boom");
        }
    }

    #[test]
    fn test_secondary_codes() {
        assert_eq!(http_status(Code::OutOfRange), Some(StatusCode::BAD_REQUEST));
        assert_eq!(http_status(Code::Aborted), Some(StatusCode::CONFLICT));
        assert_eq!(
            http_status(Code::DataLoss),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn test_unknown_code_renders_generic_message() {
        let (status, body) = ErrorResponse::from_error(&AppError::Unknown("mystery".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(body.detail, "mystery");
    }

    #[test]
    fn test_message_is_reason_phrase() {
        let (_, body) = ErrorResponse::from_error(&AppError::NotFound("admin".into()));
        assert_eq!(body.message, "Not Found");

        let (_, body) = ErrorResponse::from_error(&AppError::Canceled("gone".into()));
        assert_eq!(body.message, "Client Closed Request");
    }

    #[test]
    fn test_wrapped_status_keeps_code() {
        let err = AppError::Status(Status::failed_precondition("already verified"));
        assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert_eq!(err.detail(), "already verified");
    }

    #[test]
    fn test_kind_code_roundtrip() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from(kind.code()), kind);
        }
    }
}
