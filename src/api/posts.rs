//! Volunteer post API endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{Map, Value};

use super::{success, ApiResult};
use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::{
    parse_id, post_fields, without_id, Collection, DeleteOutcome, Document, InsertOutcome,
    ListingQuery, PostCount, UpdateOutcome,
};
use crate::AppState;

/// GET /volunteers-posts - Search, home highlights or a page of posts.
pub async fn list_posts(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<ListingQuery>, AppError>,
) -> ApiResult<Vec<Document>> {
    let listing = params.resolve(state.config.home_post_limit);
    tracing::debug!("Listing posts: {:?}", listing);

    let posts = state.repo.list_posts(&listing).await?;
    success("All post fetching success", posts)
}

/// GET /volunteer-post/:id - Get a single post; `data` is null when absent.
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Option<Document>> {
    let id = parse_id(&id)?;

    match state.repo.get_document(Collection::Posts, &id).await? {
        Some(post) => success("Post fetching success", Some(post)),
        None => success("No post found", None),
    }
}

/// GET /count - Total number of posts.
pub async fn count_posts(State(state): State<AppState>) -> ApiResult<PostCount> {
    let count = state.repo.count_documents(Collection::Posts).await?;
    success("Post count fetching success", PostCount { count })
}

/// POST /volunteers-posts - Create a post from the request body as-is.
pub async fn create_post(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<Map<String, Value>>, AppError>,
) -> ApiResult<InsertOutcome> {
    let outcome = state
        .repo
        .insert_document(Collection::Posts, &without_id(body))
        .await?;

    tracing::info!("Created post {}", outcome.inserted_id);
    success("Post created successfully", outcome)
}

/// GET /volunteers-posts/:email - Posts of the signed-in organizer.
pub async fn list_organizer_posts(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(email): Path<String>,
) -> ApiResult<Vec<Document>> {
    user.ensure_owner(&email)?;

    let posts = state
        .repo
        .find_by_field(Collection::Posts, post_fields::ORGANIZER_EMAIL, &email)
        .await?;
    success("My post fetching success", posts)
}

/// PATCH /update-post/:id - Set the given fields on a post.
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(changes), _): WithRejection<Json<Map<String, Value>>, AppError>,
) -> ApiResult<UpdateOutcome> {
    let id = parse_id(&id)?;

    let outcome = state.repo.update_post(&id, &without_id(changes)).await?;
    if outcome.matched_count == 0 {
        tracing::debug!("Update matched no post {}", id);
    }
    success("Post updated successfully", outcome)
}

/// DELETE /delete-post/:id - Delete a post.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteOutcome> {
    let id = parse_id(&id)?;

    let outcome = state.repo.delete_document(Collection::Posts, &id).await?;
    tracing::info!("Deleted {} post(s) with id {}", outcome.deleted_count, id);
    success("Post deleted successfully", outcome)
}
