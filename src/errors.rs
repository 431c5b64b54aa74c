use axum::{Json, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the domain modules, independent of HTTP.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("접근 권한이 없습니다.".to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            code: "VALIDATION_ERROR",
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "인증이 필요합니다.".to_string(),
            code: "UNAUTHORIZED",
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            code: "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let (status, code) = match &err {
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            DomainError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            DomainError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        Self {
            status,
            message: err.to_string(),
            code,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        let body = json!({
            "success": false,
            "message": self.message,
            "error": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined() {
        let err = DomainError::Validation(vec!["이름을 입력해주세요.".into(), "x".into()]);
        let app: AppError = err.into();
        assert_eq!(app.status, StatusCode::BAD_REQUEST);
        assert_eq!(app.message, "이름을 입력해주세요.\nx");
    }

    #[test]
    fn conflict_maps_to_409() {
        let app: AppError = DomainError::conflict("full").into();
        assert_eq!(app.status, StatusCode::CONFLICT);
        assert_eq!(app.code, "CONFLICT");
    }
}
