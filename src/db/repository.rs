//! Database repository for document operations.
//!
//! Every collection shares one table layout: a store-generated id, the JSON body,
//! and an insertion sequence used as the natural order.

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    post_fields, request_fields, Collection, DeleteOutcome, Document, InsertOutcome, PageRequest,
    PostListing, RequestSubmission, UpdateOutcome,
};

/// Write transactions take the lock up front so concurrent writers queue on the
/// busy timeout.
const WRITE_TRANSACTION: &str = "BEGIN IMMEDIATE";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Close the connection pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ==================== GENERIC OPERATIONS ====================

    /// List documents of a collection in insertion order, optionally capped.
    pub async fn list_documents(
        &self,
        collection: Collection,
        limit: Option<i64>,
    ) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id, body FROM {} ORDER BY seq LIMIT ?",
            collection.table()
        ))
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// Get a document by ID.
    pub async fn get_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT id, body FROM {} WHERE id = ?",
            collection.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// List documents whose top-level `field` equals `value`.
    pub async fn find_by_field(
        &self,
        collection: Collection,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id, body FROM {} WHERE json_extract(body, '$.{}') = ? ORDER BY seq",
            collection.table(),
            field
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// Insert a document verbatim and return its new id.
    pub async fn insert_document(
        &self,
        collection: Collection,
        fields: &Map<String, Value>,
    ) -> Result<InsertOutcome, AppError> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(fields)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(&format!(
            "INSERT INTO {} (id, body, created_at) VALUES (?, ?, ?)",
            collection.table()
        ))
        .bind(&id)
        .bind(&body)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    /// Delete a document by ID.
    pub async fn delete_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<DeleteOutcome, AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", collection.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }

    /// Count the documents of a collection.
    pub async fn count_documents(&self, collection: Collection) -> Result<i64, AppError> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS count FROM {}",
            collection.table()
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("count"))
    }

    // ==================== POST OPERATIONS ====================

    /// Resolve a post listing.
    pub async fn list_posts(&self, listing: &PostListing) -> Result<Vec<Document>, AppError> {
        match listing {
            PostListing::Search { title } => self.search_posts(title).await,
            PostListing::Highlights { limit } => self.upcoming_posts(*limit).await,
            PostListing::Page(page) => self.page_posts(page).await,
        }
    }

    /// Posts whose title contains `title`, ignoring case.
    ///
    /// Matching runs inside SQLite through the registered `REGEXP` function, so
    /// posts without a string title never match.
    async fn search_posts(&self, title: &str) -> Result<Vec<Document>, AppError> {
        let pattern = format!("(?i){}", regex::escape(title));

        let rows = sqlx::query(&format!(
            "SELECT id, body FROM {} WHERE json_extract(body, '$.{}') REGEXP ? ORDER BY seq",
            Collection::Posts.table(),
            post_fields::TITLE
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// Posts with the soonest deadlines.
    async fn upcoming_posts(&self, limit: i64) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id, body FROM {} ORDER BY json_extract(body, '$.{}') ASC, seq LIMIT ?",
            Collection::Posts.table(),
            post_fields::DEADLINE
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// One page of posts, optionally sorted by category.
    async fn page_posts(&self, page: &PageRequest) -> Result<Vec<Document>, AppError> {
        let order = match page.sort {
            Some(direction) => format!(
                "json_extract(body, '$.{}') {}, seq",
                post_fields::CATEGORY,
                direction.as_sql()
            ),
            None => "seq".to_string(),
        };
        let limit = page.size.map_or(-1, saturating_i64);

        let rows = sqlx::query(&format!(
            "SELECT id, body FROM {} ORDER BY {} LIMIT ? OFFSET ?",
            Collection::Posts.table(),
            order
        ))
        .bind(limit)
        .bind(saturating_i64(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// Set top-level fields on a post.
    pub async fn update_post(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<UpdateOutcome, AppError> {
        let table = Collection::Posts.table();
        let mut tx = self.pool.begin_with(WRITE_TRANSACTION).await?;

        let row = sqlx::query(&format!("SELECT body FROM {} WHERE id = ?", table))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
            });
        };

        let body: String = row.get("body");
        let mut fields: Map<String, Value> = serde_json::from_str(&body)?;
        let mut modified = false;
        for (key, value) in changes {
            if fields.get(key) != Some(value) {
                fields.insert(key.clone(), value.clone());
                modified = true;
            }
        }

        if modified {
            sqlx::query(&format!("UPDATE {} SET body = ? WHERE id = ?", table))
                .bind(serde_json::to_string(&fields)?)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    // ==================== REQUEST OPERATIONS ====================

    /// Store a volunteer request and take one slot from the referenced post.
    ///
    /// Both writes share a transaction. A `job_id` that names no post leaves the
    /// request stored with zero matched posts; `volunteers_needed` is not clamped.
    pub async fn submit_request(
        &self,
        fields: &Map<String, Value>,
    ) -> Result<RequestSubmission, AppError> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(fields)?;
        let now = Utc::now().to_rfc3339();
        let job_id = fields
            .get(request_fields::JOB_ID)
            .and_then(Value::as_str)
            .and_then(|j| Uuid::parse_str(j).ok())
            .map(|j| j.to_string());

        let mut tx = self.pool.begin_with(WRITE_TRANSACTION).await?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, body, created_at) VALUES (?, ?, ?)",
            Collection::Requests.table()
        ))
        .bind(&id)
        .bind(&body)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let affected = match job_id {
            Some(job_id) => {
                sqlx::query(&format!(
                    "UPDATE {table} SET body = json_set(body, '$.{field}', COALESCE(json_extract(body, '$.{field}'), 0) - 1) WHERE id = ?",
                    table = Collection::Posts.table(),
                    field = post_fields::VOLUNTEERS_NEEDED
                ))
                .bind(&job_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
            None => 0,
        };

        tx.commit().await?;

        if affected == 0 {
            tracing::warn!("Volunteer request {} references no existing post", id);
        }

        Ok(RequestSubmission {
            acknowledged: true,
            inserted_id: id,
            matched_count: affected,
            modified_count: affected,
        })
    }
}

// Helper functions for row conversion

fn document_from_row(row: &SqliteRow) -> Result<Document, AppError> {
    let body: String = row.get("body");
    Ok(Document {
        id: row.get("id"),
        fields: serde_json::from_str(&body)?,
    })
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::{ListingQuery, SortDirection};
    use serde_json::json;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {}", other),
        }
    }

    async fn insert_post(repo: &Repository, post: Value) -> String {
        repo.insert_document(Collection::Posts, &object(post))
            .await
            .unwrap()
            .inserted_id
    }

    fn titles(docs: &[Document]) -> Vec<&str> {
        docs.iter()
            .map(|d| d.get_str(post_fields::TITLE).unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let (repo, _dir) = repo().await;
        let post = json!({
            "post_title": "Beach Cleanup",
            "deadline": "2026-11-01",
            "volunteers_needed": 10,
            "location": {"city": "Chattogram"}
        });
        let id = insert_post(&repo, post.clone()).await;

        let doc = repo.get_document(Collection::Posts, &id).await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(Value::Object(doc.fields), post);

        let missing = Uuid::new_v4().to_string();
        assert!(repo
            .get_document(Collection::Posts, &missing)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_submit_request_decrements_in_transaction() {
        let (repo, _dir) = repo().await;
        let post_id = insert_post(&repo, json!({"post_title": "Food Drive", "volunteers_needed": 1})).await;

        let first = repo
            .submit_request(&object(json!({"job_id": post_id, "volunteer_email": "a@x.org"})))
            .await
            .unwrap();
        assert_eq!(first.matched_count, 1);

        // Over-subscription is not rejected and the count is not clamped.
        repo.submit_request(&object(json!({"job_id": post_id, "volunteer_email": "b@x.org"})))
            .await
            .unwrap();

        let post = repo.get_document(Collection::Posts, &post_id).await.unwrap().unwrap();
        assert_eq!(post.get(post_fields::VOLUNTEERS_NEEDED), Some(&json!(-1)));
        assert_eq!(repo.count_documents(Collection::Requests).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_submit_request_for_unknown_post_still_inserts() {
        let (repo, _dir) = repo().await;

        for job_id in [json!(Uuid::new_v4().to_string()), json!("garbage"), json!(42)] {
            let outcome = repo
                .submit_request(&object(json!({"job_id": job_id})))
                .await
                .unwrap();
            assert_eq!(outcome.matched_count, 0);
            assert!(repo
                .get_document(Collection::Requests, &outcome.inserted_id)
                .await
                .unwrap()
                .is_some());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_updates_and_requests_all_succeed() {
        let (repo, _dir) = repo().await;
        let post_id = insert_post(
            &repo,
            json!({"post_title": "Park Restoration", "category": "Environment", "volunteers_needed": 40}),
        )
        .await;

        let mut handles = Vec::new();
        for i in 0..40 {
            let repo = repo.clone();
            let post_id = post_id.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    repo.update_post(&post_id, &object(json!({"category": format!("Round {}", i)})))
                        .await
                        .map(|_| ())
                } else {
                    repo.submit_request(&object(json!({"job_id": post_id})))
                        .await
                        .map(|_| ())
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let post = repo.get_document(Collection::Posts, &post_id).await.unwrap().unwrap();
        assert_eq!(post.get(post_fields::VOLUNTEERS_NEEDED), Some(&json!(20)));
        assert_eq!(repo.count_documents(Collection::Requests).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_update_post_merges_top_level_fields() {
        let (repo, _dir) = repo().await;
        let id = insert_post(
            &repo,
            json!({"post_title": "Tree Planting", "category": "Environment", "volunteers_needed": 4}),
        )
        .await;

        let outcome = repo
            .update_post(&id, &object(json!({"category": "Outdoors", "volunteers_needed": 4})))
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.modified_count, 1);

        let post = repo.get_document(Collection::Posts, &id).await.unwrap().unwrap();
        assert_eq!(post.get_str("category"), Some("Outdoors"));
        assert_eq!(post.get_str(post_fields::TITLE), Some("Tree Planting"));

        let unchanged = repo
            .update_post(&id, &object(json!({"category": "Outdoors"})))
            .await
            .unwrap();
        assert_eq!(unchanged.modified_count, 0);

        let missing = repo
            .update_post(&Uuid::new_v4().to_string(), &object(json!({"category": "x"})))
            .await
            .unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    #[tokio::test]
    async fn test_listings() {
        let (repo, _dir) = repo().await;
        insert_post(&repo, json!({"post_title": "Beach Cleanup", "category": "Environment", "deadline": "2026-12-01"})).await;
        insert_post(&repo, json!({"post_title": "Reading Club", "category": "Education", "deadline": "2026-10-20"})).await;
        insert_post(&repo, json!({"post_title": "BEACH Lifeguard", "category": "Health", "deadline": "2026-11-05"})).await;
        insert_post(&repo, json!({"post_title": "Clean c++ code", "category": "Tech", "deadline": "2027-01-01"})).await;

        let search = repo
            .list_posts(&PostListing::Search { title: "beach".to_string() })
            .await
            .unwrap();
        assert_eq!(titles(&search), vec!["Beach Cleanup", "BEACH Lifeguard"]);

        let literal = repo
            .list_posts(&PostListing::Search { title: "c++".to_string() })
            .await
            .unwrap();
        assert_eq!(titles(&literal), vec!["Clean c++ code"]);

        let home = repo
            .list_posts(&PostListing::Highlights { limit: 2 })
            .await
            .unwrap();
        assert_eq!(titles(&home), vec!["Reading Club", "BEACH Lifeguard"]);

        let sorted = repo
            .list_posts(&PostListing::Page(PageRequest {
                page: 1,
                size: Some(2),
                sort: Some(SortDirection::Ascending),
            }))
            .await
            .unwrap();
        assert_eq!(titles(&sorted), vec!["Reading Club", "Beach Cleanup"]);

        let second_page = repo
            .list_posts(&ListingQuery {
                current_page: Some(2),
                size: Some(3),
                ..Default::default()
            }
            .resolve(6))
            .await
            .unwrap();
        assert_eq!(titles(&second_page), vec!["Clean c++ code"]);

        insert_post(&repo, json!({"post_title": 7, "category": "Misc"})).await;
        insert_post(&repo, json!({"post_title": "ÉCOLE Garden", "category": "Education"})).await;
        let unicode = repo
            .list_posts(&PostListing::Search { title: "école".to_string() })
            .await
            .unwrap();
        assert_eq!(titles(&unicode), vec!["ÉCOLE Garden"]);
        assert!(repo
            .list_posts(&PostListing::Search { title: "7".to_string() })
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_find_count_delete() {
        let (repo, _dir) = repo().await;
        let mine = insert_post(&repo, json!({"organizer_email": "org@x.org"})).await;
        insert_post(&repo, json!({"organizer_email": "other@x.org"})).await;

        let found = repo
            .find_by_field(Collection::Posts, post_fields::ORGANIZER_EMAIL, "org@x.org")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mine);

        assert_eq!(repo.count_documents(Collection::Posts).await.unwrap(), 2);
        assert_eq!(repo.delete_document(Collection::Posts, &mine).await.unwrap().deleted_count, 1);
        assert_eq!(repo.delete_document(Collection::Posts, &mine).await.unwrap().deleted_count, 0);
        assert_eq!(repo.count_documents(Collection::Posts).await.unwrap(), 1);
    }
}
