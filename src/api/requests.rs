//! Volunteer request API endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{Map, Value};

use super::{success, ApiResult};
use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::{
    parse_id, request_fields, without_id, Collection, DeleteOutcome, Document, RequestSubmission,
};
use crate::AppState;

/// POST /volunteer-request - Store a request and take a slot from its post.
pub async fn create_request(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<Map<String, Value>>, AppError>,
) -> ApiResult<RequestSubmission> {
    let submission = state.repo.submit_request(&without_id(body)).await?;

    tracing::info!(
        "Volunteer request {} stored, {} post(s) updated",
        submission.inserted_id,
        submission.modified_count
    );
    success("Volunteer request submitted successfully", submission)
}

/// GET /volunteer-request/:email - Requests of the signed-in volunteer.
pub async fn list_volunteer_requests(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(email): Path<String>,
) -> ApiResult<Vec<Document>> {
    user.ensure_owner(&email)?;

    let requests = state
        .repo
        .find_by_field(Collection::Requests, request_fields::VOLUNTEER_EMAIL, &email)
        .await?;
    success("Volunteer requests fetching success", requests)
}

/// DELETE /volunteer-req-cancel/:id - Cancel a request.
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteOutcome> {
    let id = parse_id(&id)?;

    let outcome = state
        .repo
        .delete_document(Collection::Requests, &id)
        .await?;
    success("Volunteer request cancelled", outcome)
}
