//! Conversion between `AppError` and `tonic::Status`.
//!
//! The canonical kind maps 1:1 onto a gRPC code (see [`crate::error`]).
//! A status that is already attached to an error is passed through as is,
//! so converting twice never changes the outcome.

use tonic::Status;

use crate::error::AppError;

/// Extension trait for converting types into `tonic::Status`.
pub trait IntoStatus {
    /// Convert into a `tonic::Status`.
    fn into_status(self) -> Status;
}

impl IntoStatus for AppError {
    fn into_status(self) -> Status {
        match self {
            AppError::Status(status) => status,
            other => {
                let code = other.kind().code();
                if matches!(other, AppError::Internal(_) | AppError::Unknown(_)) {
                    tracing::error!(error = %other, "Request failed");
                }
                Status::new(code, other.detail().to_string())
            }
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.into_status()
    }
}

/// A received status keeps its code; it is never reclassified.
impl From<Status> for AppError {
    fn from(status: Status) -> Self {
        AppError::Status(status)
    }
}

/// Result type alias for gRPC handlers.
pub type GrpcResult<T> = Result<tonic::Response<T>, Status>;
