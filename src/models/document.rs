//! Free-form documents and the collections that hold them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::AppError;

/// Field name under which the store id is exposed.
pub const ID_FIELD: &str = "_id";

/// Well-known post fields.
pub mod post_fields {
    pub const ORGANIZER_EMAIL: &str = "organizer_email";
    pub const TITLE: &str = "post_title";
    pub const CATEGORY: &str = "category";
    pub const DEADLINE: &str = "deadline";
    pub const VOLUNTEERS_NEEDED: &str = "volunteers_needed";
}

/// Well-known volunteer request fields.
pub mod request_fields {
    pub const JOB_ID: &str = "job_id";
    pub const VOLUNTEER_EMAIL: &str = "volunteer_email";
}

/// The collections of the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Posts,
    Requests,
    Events,
    Blogs,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Posts,
        Collection::Requests,
        Collection::Events,
        Collection::Blogs,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Collection::Posts => "volunteer_posts",
            Collection::Requests => "volunteer_requests",
            Collection::Events => "events",
            Collection::Blogs => "blogs",
        }
    }

    /// Key used for this collection in seed files.
    pub fn seed_key(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Requests => "requests",
            Collection::Events => "events",
            Collection::Blogs => "blogs",
        }
    }
}

/// A stored document: the store id plus the free-form JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Parse a path identifier into the canonical id form.
pub fn parse_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|e| AppError::InvalidId(format!("Invalid document id {:?}: {}", raw, e)))
}

/// Strip fields the store owns from client-supplied fields.
pub fn without_id(mut fields: Map<String, Value>) -> Map<String, Value> {
    fields.remove(ID_FIELD);
    fields
}

/// Acknowledgement of an insert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: String,
}

/// Acknowledgement of an update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Acknowledgement of a delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Acknowledgement of a volunteer request submission.
///
/// The counts describe the `volunteers_needed` decrement on the referenced post;
/// zero matches means the request was stored against an unknown post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSubmission {
    pub acknowledged: bool,
    pub inserted_id: String,
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Total number of posts.
#[derive(Debug, Clone, Serialize)]
pub struct PostCount {
    pub count: i64,
}
