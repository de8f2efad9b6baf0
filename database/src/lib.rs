use hotpost_core::{CoreError, DatabaseError, RedditPost};
use sqlx::any::{install_default_drivers, AnyRow};
use sqlx::{AnyConnection, Connection, Row};
use tracing::{debug, error, info, warn};


const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS subreddit (
        id TEXT PRIMARY KEY NOT NULL,
        title TEXT,
        score INTEGER,
        url TEXT
    )
"#;

// The existence check runs inside the INSERT, not as a separate read.
const INSERT_IF_ABSENT_SQL: &str = r#"
    INSERT INTO subreddit (id, title, score, url)
    SELECT $1, $2, $3, $4
    WHERE NOT EXISTS (
        SELECT 1 FROM subreddit WHERE id = $1
    )
"#;

const SELECT_POST_SQL: &str = "SELECT id, title, score, url FROM subreddit WHERE id = $1";
const SELECT_POSTS_SQL: &str = "SELECT id, title, score, url FROM subreddit ORDER BY id";
const COUNT_POSTS_SQL: &str = "SELECT COUNT(*) AS total FROM subreddit";

/// Single-connection store for fetched posts.
///
/// Holds one connection for the lifetime of a run. [`Database::close`]
/// consumes the store, so it can only be closed once.
pub struct Database {
    conn: AnyConnection,
}

impl Database {
    /// Opens a connection to `database_url` (`postgres://` or `sqlite:`).
    pub async fn connect(database_url: &str) -> Result<Self, CoreError> {
        install_default_drivers();

        let conn = AnyConnection::connect(database_url).await.map_err(|e| {
            error!("Database connection failed: {}", e);
            DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            }
        })?;

        info!("Connected to {} database", conn.backend_name());
        Ok(Self { conn })
    }

    /// Creates the posts table when it does not exist yet.
    pub async fn ensure_schema(&mut self) -> Result<(), CoreError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::SchemaFailed {
                reason: e.to_string(),
            })?;

        debug!("Schema for table subreddit is in place");
        Ok(())
    }

    /// Inserts every post whose id is not stored yet, in one transaction.
    ///
    /// Existing rows are left untouched. If any post fails, the whole batch
    /// is rolled back and `DatabaseError::WriteFailed` is returned. Returns
    /// the number of rows inserted.
    pub async fn write_batch(&mut self, posts: &[RedditPost]) -> Result<u64, CoreError> {
        if posts.is_empty() {
            debug!("Empty batch, nothing to write");
            return Ok(0);
        }

        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| write_failed(posts.len(), e.to_string()))?;

        match insert_all(&mut *tx, posts).await {
            Ok(inserted) => {
                tx.commit()
                    .await
                    .map_err(|e| write_failed(posts.len(), e.to_string()))?;
                info!(
                    "Stored {} new post(s), skipped {} already present",
                    inserted,
                    posts.len() as u64 - inserted
                );
                Ok(inserted)
            }
            Err(e) => {
                warn!("Rolling back batch of {} post(s): {}", posts.len(), e);
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(write_failed(posts.len(), e.to_string()))
            }
        }
    }

    /// Looks up one stored post by id.
    pub async fn get_post(&mut self, id: &str) -> Result<Option<RedditPost>, CoreError> {
        let row = sqlx::query(SELECT_POST_SQL)
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(DatabaseError::from)?;

        row.map(|row| post_from_row(&row)).transpose()
    }

    /// All stored posts, ordered by id.
    pub async fn get_posts(&mut self) -> Result<Vec<RedditPost>, CoreError> {
        let rows = sqlx::query(SELECT_POSTS_SQL)
            .fetch_all(&mut self.conn)
            .await
            .map_err(DatabaseError::from)?;

        rows.iter().map(post_from_row).collect()
    }

    /// Number of rows in the `subreddit` table.
    pub async fn count(&mut self) -> Result<u64, CoreError> {
        let row = sqlx::query(COUNT_POSTS_SQL)
            .fetch_one(&mut self.conn)
            .await
            .map_err(DatabaseError::from)?;

        let total: i64 = row.try_get("total").map_err(DatabaseError::from)?;
        Ok(total.max(0) as u64)
    }

    /// Closes the connection.
    pub async fn close(self) -> Result<(), CoreError> {
        self.conn.close().await.map_err(DatabaseError::from)?;
        debug!("Database connection closed");
        Ok(())
    }
}

async fn insert_all(conn: &mut AnyConnection, posts: &[RedditPost]) -> Result<u64, CoreError> {
    let mut inserted = 0;
    for post in posts {
        post.validate()?;

        let result = sqlx::query(INSERT_IF_ABSENT_SQL)
            .bind(post.id.as_str())
            .bind(post.title.as_str())
            .bind(post.score)
            .bind(post.url.as_str())
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            debug!("Post {} already stored, skipping", post.id);
        }
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

fn post_from_row(row: &AnyRow) -> Result<RedditPost, CoreError> {
    let id: String = row.try_get("id").map_err(DatabaseError::from)?;
    let title: Option<String> = row.try_get("title").map_err(DatabaseError::from)?;
    let score: Option<i32> = row.try_get("score").map_err(DatabaseError::from)?;
    let url: Option<String> = row.try_get("url").map_err(DatabaseError::from)?;

    Ok(RedditPost {
        id,
        title: title.unwrap_or_default(),
        score: score.unwrap_or_default(),
        url: url.unwrap_or_default(),
    })
}

fn write_failed(records: usize, reason: String) -> CoreError {
    CoreError::Database(DatabaseError::WriteFailed { records, reason })
}
