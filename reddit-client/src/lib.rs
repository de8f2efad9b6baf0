pub mod api;
pub mod auth;


pub use api::{RedditApiClient, RedditListing, RedditPostData, REDDIT_API_BASE};
pub use auth::{PasswordAuthenticator, RedditToken, REDDIT_AUTH_BASE};

use hotpost_core::{CoreError, RedditConfig, RedditPost};
use reqwest::redirect::Policy;
use tracing::{debug, info};

const MAX_SUBREDDIT_NAME_LEN: usize = 21;

/// A subreddit resolved by name, ready to be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subreddit {
    name: String,
}

impl Subreddit {
    /// Accepts `name` or `r/name`; names are ASCII alphanumerics and `_`.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        let trimmed = name.trim();
        let bare = trimmed
            .strip_prefix("/r/")
            .or_else(|| trimmed.strip_prefix("r/"))
            .unwrap_or(trimmed);

        let valid = !bare.is_empty()
            && bare.len() <= MAX_SUBREDDIT_NAME_LEN
            && bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CoreError::InvalidInput {
                message: format!("invalid subreddit name: {:?}", name),
            });
        }

        Ok(Self {
            name: bare.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Source of posts for one pipeline run.
#[allow(async_fn_in_trait)]
pub trait PostSource {
    /// Up to `limit` posts from the subreddit's hot listing, in ranking order.
    async fn fetch_hot(&mut self, subreddit: &str, limit: u32)
        -> Result<Vec<RedditPost>, CoreError>;
}

pub struct RedditClient {
    http_client: reqwest::Client,
    api: RedditApiClient,
    authenticator: PasswordAuthenticator,
    token: Option<RedditToken>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self, CoreError> {
        Self::with_endpoints(config, REDDIT_AUTH_BASE, REDDIT_API_BASE)
    }

    pub fn with_endpoints(
        config: RedditConfig,
        auth_base: &str,
        api_base: &str,
    ) -> Result<Self, CoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(api::REQUEST_TIMEOUT)
            .redirect(Policy::none())
            .build()?;

        let authenticator = PasswordAuthenticator::new(&config, auth_base)?;
        let api = RedditApiClient::new(http_client.clone(), api_base);

        Ok(Self {
            http_client,
            api,
            authenticator,
            token: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(|token| !token.is_expired())
    }

    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        let token = self.authenticator.request_token(&self.http_client).await?;
        self.token = Some(token);
        Ok(())
    }

    /// Resolves a subreddit handle. No request is made until posts are fetched.
    pub fn connect_to_subreddit(&self, name: &str) -> Result<Subreddit, CoreError> {
        let subreddit = Subreddit::parse(name)?;
        debug!("Using subreddit r/{}", subreddit.name());
        Ok(subreddit)
    }

    /// Fetches up to `limit` posts from the subreddit's hot listing.
    pub async fn fetch_posts(
        &mut self,
        subreddit: &Subreddit,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError> {
        // Reddit reads limit=0 as "default page size".
        if limit == 0 {
            return Ok(Vec::new());
        }

        let access_token = self.access_token().await?;
        let listing = self
            .api
            .get_subreddit_hot(&access_token, subreddit.name(), limit)
            .await?;

        let posts = listing.into_posts(limit as usize);
        info!("Fetched {} hot posts from r/{}", posts.len(), subreddit.name());
        Ok(posts)
    }

    async fn access_token(&mut self) -> Result<String, CoreError> {
        if !self.is_authenticated() {
            self.authenticate().await?;
        }
        self.token
            .as_ref()
            .map(|token| token.access_token.clone())
            .ok_or_else(|| CoreError::Internal {
                message: "no Reddit token after authentication".to_string(),
            })
    }
}

impl PostSource for RedditClient {
    async fn fetch_hot(
        &mut self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError> {
        let subreddit = self.connect_to_subreddit(subreddit)?;
        self.fetch_posts(&subreddit, limit).await
    }
}
