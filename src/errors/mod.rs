//! Error handling module for the ImpactMakers backend.
//!
//! Provides the centralized error type with mapping to HTTP status codes and the
//! `{message}` error envelope. Internal detail is logged, never sent to clients.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Client-facing messages.
pub mod messages {
    pub const UNAUTHORIZED: &str = "unauthorized access";
    pub const FORBIDDEN: &str = "forbidden access";
    pub const INTERNAL: &str = "Internal server error";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No session cookie
    Unauthorized,
    /// Invalid/expired token or ownership mismatch
    Forbidden(String),
    /// Path identifier that is not a well-formed document id
    InvalidId(String),
    /// Database error
    Database(String),
    /// Session token could not be signed
    Token(String),
    /// Mail relay error
    Mail(String),
    /// Invalid configuration
    Config(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidId(_)
            | AppError::Database(_)
            | AppError::Token(_)
            | AppError::Mail(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message sent to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            AppError::Unauthorized => messages::UNAUTHORIZED,
            AppError::Forbidden(_) => messages::FORBIDDEN,
            _ => messages::INTERNAL,
        }
    }

    /// Get the internal detail of this error.
    pub fn detail(&self) -> &str {
        match self {
            AppError::Unauthorized => "no session token",
            AppError::Forbidden(msg)
            | AppError::InvalidId(msg)
            | AppError::Database(msg)
            | AppError::Token(msg)
            | AppError::Mail(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.client_message(), self.detail())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::error!("Token signing error: {:?}", err);
        AppError::Token(format!("Token signing error: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        tracing::error!("Mail relay error: {:?}", err);
        AppError::Mail(format!("Mail relay error: {}", err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        tracing::error!("Mail build error: {:?}", err);
        AppError::Mail(format!("Mail build error: {}", err))
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(err: lettre::address::AddressError) -> Self {
        tracing::error!("Mail address error: {:?}", err);
        AppError::Mail(format!("Mail address error: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::error!("Rejected request body: {}", rejection.body_text());
        AppError::Internal(format!("Rejected request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::error!("Rejected query string: {}", rejection.body_text());
        AppError::Internal(format!("Rejected query string: {}", rejection.body_text()))
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.detail());
        } else {
            tracing::debug!("Request rejected: {}", self.detail());
        }

        let body = ErrorResponse {
            message: self.client_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("email mismatch".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidId("abc".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = AppError::Database("disk I/O error at /var/lib/impact".to_string());
        assert_eq!(err.client_message(), messages::INTERNAL);
        assert!(err.to_string().contains("disk I/O"));
    }
}
