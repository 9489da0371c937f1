//! Optional seeding of empty collections from a JSON file.
//!
//! The file is an object keyed by collection (`posts`, `requests`, `events`,
//! `blogs`), each holding an array of documents.

use std::path::Path;

use serde_json::{Map, Value};

use super::Repository;
use crate::errors::AppError;
use crate::models::{without_id, Collection};

/// Seed every empty collection present in the file. Returns the number of inserted documents.
pub async fn seed_from_file(repo: &Repository, path: &Path) -> Result<usize, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Config(format!("Failed to read seed file {:?}: {}", path, e)))?;
    let seed: Map<String, Value> = serde_json::from_str(&raw)?;

    seed_collections(repo, &seed).await
}

/// Seed every empty collection present in `seed`.
pub async fn seed_collections(
    repo: &Repository,
    seed: &Map<String, Value>,
) -> Result<usize, AppError> {
    let mut inserted = 0;

    for collection in Collection::ALL {
        let Some(Value::Array(documents)) = seed.get(collection.seed_key()) else {
            continue;
        };

        if repo.count_documents(collection).await? > 0 {
            tracing::debug!(
                "Collection {} already populated, skipping seed",
                collection.table()
            );
            continue;
        }

        let before = inserted;
        for document in documents {
            let Value::Object(fields) = document else {
                tracing::warn!(
                    "Skipping non-object seed entry in {}",
                    collection.seed_key()
                );
                continue;
            };
            repo.insert_document(collection, &without_id(fields.clone()))
                .await?;
            inserted += 1;
        }

        tracing::info!(
            "Seeded {} with {} documents",
            collection.table(),
            inserted - before
        );
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_seed_only_fills_empty_collections() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("seed.sqlite"))
            .await
            .unwrap();
        let repo = Repository::new(pool);

        let seed = json!({
            "events": [{"title": "Winter Clothes Drive"}, {"title": "Blood Donation Camp"}],
            "blogs": [{"_id": "legacy", "title": "Why volunteer?"}, "not a document"],
            "unknown": [{"ignored": true}]
        });
        let Value::Object(seed) = seed else {
            unreachable!()
        };

        let inserted = seed_collections(&repo, &seed).await.unwrap();
        assert_eq!(inserted, 3);

        let blogs = repo.list_documents(Collection::Blogs, None).await.unwrap();
        assert_eq!(blogs.len(), 1);
        assert_ne!(blogs[0].id, "legacy");

        // Second run is a no-op.
        assert_eq!(seed_collections(&repo, &seed).await.unwrap(), 0);
        assert_eq!(repo.count_documents(Collection::Events).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_seed_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("seed.sqlite"))
            .await
            .unwrap();
        let repo = Repository::new(pool);

        let path = temp_dir.path().join("seed.json");
        std::fs::write(&path, r#"{"posts": [{"post_title": "Park Restoration"}]}"#).unwrap();

        assert_eq!(seed_from_file(&repo, &path).await.unwrap(), 1);
        assert!(seed_from_file(&repo, &temp_dir.path().join("missing.json"))
            .await
            .is_err());
    }
}
