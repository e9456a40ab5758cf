use crate::domain::document::Document;
use crate::error::{AppError, Result};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

use super::DbPool;

/// Repository over the `documents` table. Timestamps are persisted as unix
/// seconds so the sweep predicate is exact at the expiry boundary.
#[derive(Clone, Debug)]
pub struct DocumentRepository {
    pool: DbPool,
}

fn row_to_document(row: &SqliteRow) -> Result<Document> {
    let created_at = OffsetDateTime::from_unix_timestamp(row.try_get("created_at")?)
        .map_err(|_| AppError::Internal)?;
    let expires_at = OffsetDateTime::from_unix_timestamp(row.try_get("expires_at")?)
        .map_err(|_| AppError::Internal)?;

    Ok(Document {
        code: row.try_get("code")?,
        filename: row.try_get("filename")?,
        content: row.try_get("content")?,
        extracted_text: row.try_get("extracted_text")?,
        created_at,
        ttl_minutes: row.try_get("ttl_minutes")?,
        expires_at,
    })
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persists a new document record.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the code is already taken, or
    /// `AppError::Database` on any other write failure.
    #[tracing::instrument(skip(self, document), fields(code = %document.code))]
    pub async fn insert(&self, document: &Document) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO documents (code, filename, content, extracted_text, created_at, ttl_minutes, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&document.code)
        .bind(&document.filename)
        .bind(&document.content)
        .bind(&document.extracted_text)
        .bind(document.created_at.unix_timestamp())
        .bind(document.ttl_minutes)
        .bind(document.expires_at.unix_timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict(format!("Code {} already in use", document.code)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Point lookup by code. Returns whatever is physically present; logical
    /// expiry is the caller's concern.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r"
            SELECT code, filename, content, extracted_text, created_at, ttl_minutes, expires_at
            FROM documents
            WHERE code = ?
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    /// Idempotent single-record delete. Deleting an unknown or already-deleted
    /// code is a no-op; both expiry paths rely on this.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the statement fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_code(&self, code: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE code = ?").bind(code).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Batch delete of every record whose expiry has arrived. Inclusive
    /// boundary: a record expiring exactly at `now` is removed.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the statement fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE expires_at <= ?")
            .bind(now.unix_timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count of documents still live at `now`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn count_active(&self, now: OffsetDateTime) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM documents WHERE expires_at > ?")
            .bind(now.unix_timestamp())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
