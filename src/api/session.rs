//! Session token endpoints.

use axum::{extract::State, Json};
use axum_extra::extract::{cookie::CookieJar, WithRejection};

use super::ApiResponse;
use crate::auth::{cleared_session_cookie, session_cookie, TokenRequest};
use crate::errors::AppError;
use crate::AppState;

/// POST /jwt - Issue a session token as an HTTP-only cookie.
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<TokenRequest>, AppError>,
) -> Result<(CookieJar, ApiResponse<()>), AppError> {
    let email = request.email.clone();
    let token = state.tokens.issue(request)?;

    tracing::info!("Issued session token for {}", email);
    Ok((
        jar.add(session_cookie(token, state.config.environment)),
        ApiResponse::new("Token issued", ()),
    ))
}

/// POST /log-out - Clear the session cookie.
pub async fn log_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<()>) {
    (
        jar.add(cleared_session_cookie(state.config.environment)),
        ApiResponse::new("Logged out", ()),
    )
}
