//! REST API module.
//!
//! Contains all API routes and handlers. Every success is wrapped in the
//! `{success, message, data}` envelope; errors render through [`AppError`].

mod content;
mod notify;
mod posts;
mod requests;
mod session;

pub use content::*;
pub use notify::*;
pub use posts::*;
pub use requests::*;
pub use session::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(message: &str, data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(message, data))
}
