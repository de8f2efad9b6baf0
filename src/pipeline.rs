//! One run: fetch the hot listing, then store it.

use database::Database;
use hotpost_core::{CoreError, ErrorReporter, RedditPost};
use reddit_client::PostSource;
use tracing::info;

pub const SUBREDDIT: &str = "redditdev";
pub const POST_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub inserted: u64,
}

pub async fn run<S: PostSource>(
    source: &mut S,
    database_url: &str,
    subreddit: &str,
    limit: u32,
) -> Result<RunSummary, CoreError> {
    let posts = source.fetch_hot(subreddit, limit).await?;
    info!("Fetched {} post(s) from r/{}", posts.len(), subreddit);

    let db = Database::connect(database_url).await?;
    let inserted = store_posts(db, &posts).await?;

    Ok(RunSummary {
        fetched: posts.len(),
        inserted,
    })
}

/// Writes `posts` and closes `db` whether or not the write succeeded.
pub async fn store_posts(mut db: Database, posts: &[RedditPost]) -> Result<u64, CoreError> {
    let written = write_posts(&mut db, posts).await;
    let closed = db.close().await;

    match (written, closed) {
        (Ok(inserted), Ok(())) => Ok(inserted),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            ErrorReporter::new().report_warning(&close_err);
            Err(e)
        }
    }
}

async fn write_posts(db: &mut Database, posts: &[RedditPost]) -> Result<u64, CoreError> {
    db.ensure_schema().await?;
    db.write_batch(posts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotpost_core::{DatabaseError, RedditApiError};
    use std::env;

    struct MockSource {
        posts: Vec<RedditPost>,
        fail: bool,
        calls: Vec<(String, u32)>,
    }

    impl MockSource {
        fn returning(posts: Vec<RedditPost>) -> Self {
            Self {
                posts,
                fail: false,
                calls: Vec::new(),
            }
        }

        fn failing() -> Self {
            Self {
                posts: Vec::new(),
                fail: true,
                calls: Vec::new(),
            }
        }
    }

    impl PostSource for MockSource {
        async fn fetch_hot(
            &mut self,
            subreddit: &str,
            limit: u32,
        ) -> Result<Vec<RedditPost>, CoreError> {
            self.calls.push((subreddit.to_string(), limit));
            if self.fail {
                return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "bad credentials".to_string(),
                }));
            }
            Ok(self.posts.iter().take(limit as usize).cloned().collect())
        }
    }

    fn test_db_url() -> String {
        let db_path = env::temp_dir().join(format!("test_pipeline_{}.db", uuid::Uuid::new_v4()));
        format!("sqlite://{}?mode=rwc", db_path.display())
    }

    #[tokio::test]
    async fn test_run_stores_fetched_posts() {
        let url = test_db_url();
        let mut source = MockSource::returning(vec![
            RedditPost::new("a1", "T1", 5, "u1"),
            RedditPost::new("a2", "T2", 3, "u2"),
        ]);

        let summary = run(&mut source, &url, SUBREDDIT, POST_LIMIT).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                fetched: 2,
                inserted: 2
            }
        );
        assert_eq!(source.calls, vec![("redditdev".to_string(), 10)]);

        let mut source = MockSource::returning(vec![
            RedditPost::new("a1", "CHANGED", 99, "u1"),
            RedditPost::new("a3", "T3", 1, "u3"),
        ]);
        let summary = run(&mut source, &url, SUBREDDIT, POST_LIMIT).await.unwrap();
        assert_eq!(summary.inserted, 1);

        let mut db = Database::connect(&url).await.unwrap();
        assert_eq!(
            db.get_posts().await.unwrap(),
            vec![
                RedditPost::new("a1", "T1", 5, "u1"),
                RedditPost::new("a2", "T2", 3, "u2"),
                RedditPost::new("a3", "T3", 1, "u3"),
            ]
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_source_failure_stops_before_storage() {
        let url = test_db_url();
        let mut source = MockSource::failing();

        let err = run(&mut source, &url, SUBREDDIT, POST_LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_and_nothing_is_stored() {
        let url = test_db_url();
        let mut source = MockSource::returning(vec![
            RedditPost::new("a1", "T1", 5, "u1"),
            RedditPost::new("", "broken", 0, "u?"),
        ]);

        let err = run(&mut source, &url, SUBREDDIT, POST_LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::WriteFailed { records: 2, .. })
        ));

        let mut db = Database::connect(&url).await.unwrap();
        assert_eq!(db.count().await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_store_posts_with_no_posts() {
        let db = Database::connect(&test_db_url()).await.unwrap();
        assert_eq!(store_posts(db, &[]).await.unwrap(), 0);
    }
}
