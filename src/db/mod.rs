//! Database module for SQLite persistence.
//!
//! Each collection is a table of JSON documents; SQLite is the document store.

mod repository;
mod seed;

pub use repository::*;
pub use seed::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::models::Collection;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30))
        .with_regexp();

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Create collection tables and indexes if they don't exist.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for collection in Collection::ALL {
        // `seq` keeps insertion order for unsorted listings.
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                body TEXT NOT NULL CHECK (json_valid(body)),
                created_at TEXT NOT NULL
            );
            "#,
            table = collection.table()
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_organizer_email
            ON volunteer_posts(json_extract(body, '$.organizer_email'));
        CREATE INDEX IF NOT EXISTS idx_posts_deadline
            ON volunteer_posts(json_extract(body, '$.deadline'));
        CREATE INDEX IF NOT EXISTS idx_posts_category
            ON volunteer_posts(json_extract(body, '$.category'));
        CREATE INDEX IF NOT EXISTS idx_requests_volunteer_email
            ON volunteer_requests(json_extract(body, '$.volunteer_email'));
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
