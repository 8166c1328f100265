use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::TransactionError;
use thiserror::Error;

use crate::routes::ApiResponse;

/// Envelope code for a successful call
pub const CODE_SUCCESS: i32 = 0;
/// Envelope code for validation and business rule failures
pub const CODE_PARAMS_ERROR: i32 = 40000;
/// Envelope code for a caller without a session
pub const CODE_NOT_LOGIN: i32 = 40100;
/// Envelope code for storage and other internal failures
pub const CODE_SYSTEM_ERROR: i32 = 50000;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No logged-in user, or acting on another user's record
    #[error("{0}")]
    Unauthorized(String),

    /// Logged in, but not allowed (not the owner, private team)
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad field values: ranges, missing or wrong passwords, timestamps
    #[error("{0}")]
    Validation(String),

    /// Team full, or the caller already sits in too many teams
    #[error("{0}")]
    Capacity(String),

    /// Operation not valid in the current membership state
    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl AppError {
    /// Caller is not logged in
    pub fn not_login() -> Self {
        AppError::Unauthorized("用户未登录".to_string())
    }

    /// Envelope code for this error
    pub fn code(&self) -> i32 {
        match self {
            AppError::Unauthorized(_) => CODE_NOT_LOGIN,
            AppError::Forbidden(_)
            | AppError::NotFound(_)
            | AppError::Validation(_)
            | AppError::Capacity(_)
            | AppError::Conflict(_) => CODE_PARAMS_ERROR,
            AppError::Internal(_) | AppError::Database(_) => CODE_SYSTEM_ERROR,
        }
    }

    /// Message shown to the client
    pub fn message(&self) -> String {
        match self {
            AppError::Internal(_) | AppError::Database(_) => "系统错误".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::OK,
        };

        let body = ApiResponse::<()>::error(self.code(), self.message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}

impl From<TransactionError<AppError>> for AppError {
    fn from(err: TransactionError<AppError>) -> Self {
        match err {
            TransactionError::Connection(e) => AppError::Database(e),
            TransactionError::Transaction(e) => e,
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", err))
    }
}

/// Helper to convert anyhow errors to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::not_login().code(), CODE_NOT_LOGIN);
        assert_eq!(AppError::Capacity("队伍已满".into()).code(), CODE_PARAMS_ERROR);
        assert_eq!(AppError::Forbidden("无权限".into()).code(), CODE_PARAMS_ERROR);
        assert_eq!(AppError::Internal("boom".into()).code(), CODE_SYSTEM_ERROR);
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = AppError::Internal("connection reset".into());
        assert_eq!(err.message(), "系统错误");
        let err = AppError::Validation("密码错误".into());
        assert_eq!(err.message(), "密码错误");
    }

    #[test]
    fn test_error_response_status() {
        let response = AppError::NotFound("队伍不存在".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_not_found("队伍不存在");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_transaction_error_unwraps() {
        let err: AppError =
            TransactionError::Transaction(AppError::Capacity("队伍已满".into())).into();
        assert!(matches!(err, AppError::Capacity(ref m) if m == "队伍已满"));
    }
}
