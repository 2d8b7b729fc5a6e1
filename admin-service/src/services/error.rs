//! Store and provider error taxonomies, and their classification into
//! the canonical `AppError`.
//!
//! | Source | AppError |
//! |--------|----------|
//! | store: not found | `NotFound` |
//! | store: already exists | `AlreadyExists` |
//! | store: failed precondition | `FailedPrecondition` |
//! | store: deadline exceeded | `DeadlineExceeded` |
//! | provider: unauthenticated / not found | `Unauthenticated` |
//! | provider: already exists | `AlreadyExists` |
//! | provider: resource exhausted | `ResourceExhausted` |
//! | provider: canceled | `Canceled` |
//! | provider: timeout | `DeadlineExceeded` |
//! | provider: invalid argument | `InvalidArgument` |
//! | context canceled / deadline exceeded | `Canceled` / `DeadlineExceeded` |
//! | database failure | `Internal` |
//! | unclassified provider failure | `Unknown` |

use service_core::error::AppError;
use thiserror::Error;

use super::context::ContextError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("admin not found")]
    NotFound,

    #[error("admin already exists")]
    AlreadyExists,

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The provider callback failed inside the transaction; the local write
    /// was rolled back.
    #[error(transparent)]
    Hook(ProviderError),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadyExists
            }
            sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
                StoreError::FailedPrecondition(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => StoreError::DeadlineExceeded,
            other => StoreError::Database(other),
        }
    }
}

impl From<ContextError> for StoreError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => StoreError::Canceled,
            ContextError::DeadlineExceeded => StoreError::DeadlineExceeded,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("provider: unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("provider: not found: {0}")]
    NotFound(String),

    #[error("provider: already exists: {0}")]
    AlreadyExists(String),

    #[error("provider: resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("provider: canceled")]
    Canceled,

    #[error("provider: timeout")]
    Timeout,

    #[error("provider: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderError::InvalidArgument(_) => "invalid_argument",
            ProviderError::Unauthenticated(_) => "unauthenticated",
            ProviderError::NotFound(_) => "not_found",
            ProviderError::AlreadyExists(_) => "already_exists",
            ProviderError::ResourceExhausted(_) => "resource_exhausted",
            ProviderError::Canceled => "canceled",
            ProviderError::Timeout => "timeout",
            ProviderError::Unknown(_) => "unknown",
        }
    }
}

impl From<ContextError> for ProviderError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => ProviderError::Canceled,
            ContextError::DeadlineExceeded => ProviderError::Timeout,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let detail = err.to_string();
        match err {
            StoreError::NotFound => AppError::NotFound(detail),
            StoreError::AlreadyExists => AppError::AlreadyExists(detail),
            StoreError::FailedPrecondition(_) => AppError::FailedPrecondition(detail),
            StoreError::InvalidArgument(_) => AppError::InvalidArgument(detail),
            StoreError::Canceled => AppError::Canceled(detail),
            StoreError::DeadlineExceeded => AppError::DeadlineExceeded(detail),
            StoreError::Hook(provider) => provider.into(),
            StoreError::Database(_) => AppError::Internal(detail),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let detail = err.to_string();
        match err {
            ProviderError::InvalidArgument(_) => AppError::InvalidArgument(detail),
            ProviderError::Unauthenticated(_) | ProviderError::NotFound(_) => {
                AppError::Unauthenticated(detail)
            }
            ProviderError::AlreadyExists(_) => AppError::AlreadyExists(detail),
            ProviderError::ResourceExhausted(_) => AppError::ResourceExhausted(detail),
            ProviderError::Canceled => AppError::Canceled(detail),
            ProviderError::Timeout => AppError::DeadlineExceeded(detail),
            ProviderError::Unknown(_) => AppError::Unknown(detail),
        }
    }
}

impl From<ContextError> for AppError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => AppError::Canceled(err.to_string()),
            ContextError::DeadlineExceeded => AppError::DeadlineExceeded(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use service_core::error::ErrorResponse;
    use service_core::grpc::IntoStatus;
    use tonic::Code;

    fn rendered(err: AppError) -> (u16, Code) {
        let code = err.code();
        let (status, body) = ErrorResponse::from_error(&err);
        assert!(!body.detail.is_empty(), "detail must always be populated");
        assert_eq!(err.into_status().code(), code);
        (status.as_u16(), code)
    }

    #[test]
    fn test_store_sentinels() {
        let cases = [
            (StoreError::NotFound, 404, Code::NotFound),
            (StoreError::AlreadyExists, 409, Code::AlreadyExists),
            (
                StoreError::FailedPrecondition("locked".into()),
                412,
                Code::FailedPrecondition,
            ),
            (StoreError::DeadlineExceeded, 504, Code::DeadlineExceeded),
            (StoreError::Canceled, 499, Code::Cancelled),
            (
                StoreError::InvalidArgument("bad id".into()),
                400,
                Code::InvalidArgument,
            ),
            (
                StoreError::Database(sqlx::Error::PoolClosed),
                500,
                Code::Internal,
            ),
        ];
        for (err, status, code) in cases {
            let label = err.to_string();
            assert_eq!(rendered(err.into()), (status, code), "{}", label);
        }
    }

    #[test]
    fn test_provider_sentinels() {
        let cases = [
            (
                ProviderError::Unauthenticated("bad password".into()),
                401,
                Code::Unauthenticated,
            ),
            (
                ProviderError::NotFound("no user".into()),
                401,
                Code::Unauthenticated,
            ),
            (
                ProviderError::AlreadyExists("taken".into()),
                409,
                Code::AlreadyExists,
            ),
            (
                ProviderError::ResourceExhausted("slow down".into()),
                429,
                Code::ResourceExhausted,
            ),
            (ProviderError::Canceled, 499, Code::Cancelled),
            (ProviderError::Timeout, 504, Code::DeadlineExceeded),
            (
                ProviderError::InvalidArgument("code mismatch".into()),
                400,
                Code::InvalidArgument,
            ),
            (ProviderError::Unknown("boom".into()), 500, Code::Unknown),
        ];
        for (err, status, code) in cases {
            let label = err.to_string();
            assert_eq!(rendered(err.into()), (status, code), "{}", label);
        }
    }

    #[test]
    fn test_context_errors() {
        assert_eq!(
            rendered(ContextError::Canceled.into()),
            (499, Code::Cancelled)
        );
        assert_eq!(
            rendered(ContextError::DeadlineExceeded.into()),
            (504, Code::DeadlineExceeded)
        );
    }

    #[test]
    fn test_hook_error_classifies_as_provider_error() {
        let err = StoreError::Hook(ProviderError::ResourceExhausted("throttled".into()));
        let app: AppError = err.into();
        assert_eq!(app.code(), Code::ResourceExhausted);
        assert!(app.detail().contains("throttled"));
    }

    #[test]
    fn test_unknown_provider_error_uses_generic_message() {
        let app: AppError = ProviderError::Unknown("weird".into()).into();
        let (status, body) = ErrorResponse::from_error(&app);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "unknown error code");
        assert!(body.detail.contains("weird"));
    }

    #[test]
    fn test_sqlx_mapping() {
        assert!(StoreError::from(sqlx::Error::RowNotFound).is_not_found());
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::DeadlineExceeded
        ));
    }
}
