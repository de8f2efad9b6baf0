use hotpost_core::{CoreError, RedditApiError, RedditPost};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const LINK_KIND: &str = "t3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: i32,
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            score: post_data.score,
            url: post_data.url,
        }
    }
}

impl RedditListing<RedditPostData> {
    /// Link posts in listing order, capped at `limit`.
    pub fn into_posts(self, limit: usize) -> Vec<RedditPost> {
        self.data
            .children
            .into_iter()
            .filter(|child| child.kind == LINK_KIND)
            .take(limit)
            .map(|child| child.data.into())
            .collect()
    }
}

/// Thin wrapper over the authenticated `oauth.reddit.com` endpoints.
#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
    api_base: String,
}

impl RedditApiClient {
    pub fn new(http_client: Client, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into(),
        }
    }

    /// Sends an authenticated request and returns the response whatever its status.
    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            if e.is_timeout() {
                CoreError::RedditApi(RedditApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })
    }

    /// Passes successful responses through and maps everything else to an error.
    pub fn check_status(response: Response, endpoint: &str) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let api_error = match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            StatusCode::UNAUTHORIZED => RedditApiError::InvalidToken,
            StatusCode::FORBIDDEN => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            status if status.is_server_error() => RedditApiError::ServerError {
                status_code: status.as_u16(),
            },
            status => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", status, endpoint),
            },
        };
        Err(CoreError::RedditApi(api_error))
    }

    /// Fetches one page of the `hot` listing for a subreddit.
    pub async fn get_subreddit_hot(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/hot", subreddit);
        let limit_str = limit.to_string();
        let params = [("limit", limit_str.as_str()), ("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params))
            .await?;

        // Unknown subreddits answer 404 or redirect to the search page.
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status.is_redirection() {
            warn!("r/{} could not be resolved (status {})", subreddit, status);
            return Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            }));
        }
        let response = Self::check_status(response, &endpoint)?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_data(id: &str, score: i32) -> RedditPostData {
        RedditPostData {
            id: id.to_string(),
            title: format!("Post {}", id),
            url: format!("https://example.com/{}", id),
            score,
        }
    }

    fn listing(children: Vec<(&str, RedditPostData)>) -> RedditListing<RedditPostData> {
        RedditListing {
            data: RedditListingData {
                children: children
                    .into_iter()
                    .map(|(kind, data)| RedditListingChild {
                        kind: kind.to_string(),
                        data,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_reddit_post_conversion() {
        let reddit_post: RedditPost = post_data("test123", 42).into();
        assert_eq!(reddit_post.id, "test123");
        assert_eq!(reddit_post.title, "Post test123");
        assert_eq!(reddit_post.score, 42);
        assert_eq!(reddit_post.url, "https://example.com/test123");
    }

    #[test]
    fn test_into_posts_keeps_order_and_caps_at_limit() {
        let listing = listing(vec![
            ("t3", post_data("a", 3)),
            ("t3", post_data("b", 2)),
            ("t3", post_data("c", 1)),
        ]);

        let ids: Vec<String> = listing.into_posts(2).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_into_posts_skips_non_link_children() {
        let listing = listing(vec![("t1", post_data("x", 1)), ("t3", post_data("y", 1))]);

        let posts = listing.into_posts(10);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "y");
    }

    #[test]
    fn test_listing_parses_minimal_payload() {
        let json = r#"{
            "data": {
                "children": [
                    {"kind": "t3", "data": {"id": "a1", "title": "T1", "url": "u1", "score": 5}}
                ]
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(json).unwrap();
        let posts = listing.into_posts(10);
        assert_eq!(posts, vec![RedditPost::new("a1", "T1", 5, "u1")]);
    }

    #[test]
    fn test_listing_ignores_fields_we_do_not_store() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_a2",
                "before": null,
                "dist": 1,
                "children": [
                    {"kind": "t3", "data": {
                        "id": "a1", "title": "T1", "url": "u1", "score": 5,
                        "subreddit": "redditdev", "permalink": "/r/redditdev/comments/a1/",
                        "stickied": true, "num_comments": 12
                    }}
                ]
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(json).unwrap();
        let posts = listing.into_posts(10);
        assert_eq!(posts, vec![RedditPost::new("a1", "T1", 5, "u1")]);
    }
}
