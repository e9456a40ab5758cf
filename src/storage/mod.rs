use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

pub mod document_repo;

pub type DbPool = Pool<Sqlite>;

/// Initializes the database connection pool.
///
/// A single connection keeps SQLite writes serialized; record operations are
/// single statements, so no cross-operation transactions are needed.
///
/// # Errors
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn init_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new().max_connections(1).connect_with(options).await
}

/// Bootstraps the schema. Idempotent; runs at every startup.
///
/// # Errors
/// Returns `sqlx::Error` if a statement fails.
pub async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS documents (
            code TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            content BLOB NOT NULL,
            extracted_text TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            ttl_minutes INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    // The sweep filters purely on expires_at
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_expires_at ON documents (expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}
