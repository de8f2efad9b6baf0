use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// A post from a subreddit listing, flattened to the columns we persist.
///
/// The score is a snapshot taken at fetch time and is never refreshed once
/// the row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub score: i32,
    pub url: String,
}

impl RedditPost {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        score: i32,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            score,
            url: url.into(),
        }
    }

    /// Rejects records that cannot be keyed in storage.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::InvalidInput {
                message: format!("post has an empty id (title: {:?})", self.title),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_keyed_post() {
        let post = RedditPost::new("a1", "T1", 5, "u1");
        assert!(post.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let post = RedditPost::new("  ", "T1", 5, "u1");
        let err = post.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }
}
