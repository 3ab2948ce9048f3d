use chrono::{DateTime, Utc};
use sqlx::AnyPool;

use crate::models::{Paste, PasteRow};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS paste (
    id TEXT PRIMARY KEY NOT NULL,
    content TEXT NOT NULL,
    created_at BIGINT NOT NULL,
    expires_at BIGINT,
    max_views BIGINT,
    view_count BIGINT NOT NULL DEFAULT 0
)";

const PASTE_COLUMNS: &str = "id, content, created_at, expires_at, max_views, view_count";

/// Fields of a paste about to be inserted.
#[derive(Debug, Clone)]
pub struct NewPaste<'a> {
    pub id: &'a str,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i64>,
}

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Connect to a database by URL and make sure the schema exists.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let database = Self {
            pool: AnyPool::connect(url).await?,
        };
        sqlx::query(SCHEMA).execute(&database.pool).await?;
        Ok(database)
    }

    /// Round-trip a trivial query to check the store is reachable.
    pub async fn ping(&self) -> crate::ApiResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a paste with a zero view count.
    ///
    /// An id collision fails the primary key constraint and comes back as a
    /// database error.
    pub async fn insert_paste(&self, paste: NewPaste<'_>) -> crate::ApiResult<Paste> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, PasteRow>(&format!(
            "INSERT INTO paste (id, content, created_at, expires_at, max_views, view_count) \
             VALUES (?, ?, ?, ?, ?, 0) RETURNING {PASTE_COLUMNS}"
        ))
        .bind(paste.id)
        .bind(paste.content)
        .bind(paste.created_at.timestamp_millis())
        .bind(paste.expires_at.map(|t| t.timestamp_millis()))
        .bind(paste.max_views)
        .fetch_one(&mut conn)
        .await?;
        row.try_into()
    }

    /// Atomically check a paste's constraints at `now` and count one view.
    ///
    /// The expiry check, the view limit check and the increment are one
    /// statement, so concurrent calls can never push `view_count` past
    /// `max_views`. Returns the paste as it is after the increment, or `None`
    /// if it is absent, timed out or exhausted. Nothing is written in the
    /// `None` case.
    pub async fn retrieve_paste(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> crate::ApiResult<Option<Paste>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, PasteRow>(&format!(
            "UPDATE paste SET view_count = view_count + 1 \
             WHERE id = ? \
             AND (expires_at IS NULL OR expires_at > ?) \
             AND (max_views IS NULL OR view_count < max_views) \
             RETURNING {PASTE_COLUMNS}"
        ))
        .bind(id)
        .bind(now.timestamp_millis())
        .fetch_optional(&mut conn)
        .await?;
        row.map(Paste::try_from).transpose()
    }

    /// Get a paste by id without counting a view.
    pub async fn get_paste(&self, id: &str) -> crate::ApiResult<Option<Paste>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, PasteRow>(&format!(
            "SELECT {PASTE_COLUMNS} FROM paste WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;
        row.map(Paste::try_from).transpose()
    }

    /// Delete every paste that timed out by `now` or ran out of views.
    pub async fn delete_dead_pastes(&self, now: DateTime<Utc>) -> crate::ApiResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query(
            "DELETE FROM paste \
             WHERE (expires_at IS NOT NULL AND expires_at <= ?) \
             OR (max_views IS NOT NULL AND view_count >= max_views)",
        )
        .bind(now.timestamp_millis())
        .execute(&mut conn)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::Database;

    /// A database backed by a fresh SQLite file. Keep the `TempDir` alive for
    /// as long as the database is used.
    pub async fn temp_database() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let database = Database::connect(&url).await.unwrap();
        (database, dir)
    }
}
