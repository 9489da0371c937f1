//! Read-only event and blog endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{parse_id, Collection, Document};
use crate::AppState;

/// Number of blogs in the condensed blog listing.
const BLOG_PREVIEW_LIMIT: i64 = 3;

/// Query parameters of the blog listing.
#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    #[serde(default)]
    pub condition: Option<String>,
}

/// GET /events - All events.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Vec<Document>> {
    let events = state.repo.list_documents(Collection::Events, None).await?;
    success("All events fetching success", events)
}

/// GET /blogs - All blogs, or the first few when `condition` is given.
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(params): Query<BlogQuery>,
) -> ApiResult<Vec<Document>> {
    let limit = params
        .condition
        .filter(|c| !c.is_empty())
        .map(|_| BLOG_PREVIEW_LIMIT);

    let blogs = state.repo.list_documents(Collection::Blogs, limit).await?;
    success("All blogs fetching success", blogs)
}

/// GET /blog/:id - Get a single blog.
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Option<Document>> {
    let id = parse_id(&id)?;

    let blog = state.repo.get_document(Collection::Blogs, &id).await?;
    success("Blog fetching success", blog)
}
