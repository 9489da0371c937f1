//! Email notification endpoint.

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::mail::OutgoingMail;
use crate::AppState;

/// Body of `POST /send-email`.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub email: String,
}

/// POST /send-email - Send the subscription notification; `data` is the relay's reply.
pub async fn send_email(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<SendEmailRequest>, AppError>,
) -> ApiResult<String> {
    let reply = state
        .mailer
        .send(OutgoingMail::notification(&request.email))
        .await?;
    success("Email sent successfully", reply)
}
