//! Script-app authentication: the OAuth2 resource-owner password grant.

use hotpost_core::{CoreError, RedditApiError, RedditConfig};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    ResourceOwnerPassword, ResourceOwnerUsername, TokenResponse, TokenUrl,
};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};

pub const REDDIT_AUTH_BASE: &str = "https://www.reddit.com";

// Reddit script tokens last an hour when the response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

pub struct PasswordAuthenticator {
    oauth_client: BasicClient,
    username: ResourceOwnerUsername,
    password: ResourceOwnerPassword,
}

impl PasswordAuthenticator {
    pub fn new(config: &RedditConfig, auth_base: &str) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(format!("{}/api/v1/authorize", auth_base))
            .map_err(|e| invalid_endpoint(auth_base, e))?;
        let token_url = TokenUrl::new(format!("{}/api/v1/access_token", auth_base))
            .map_err(|e| invalid_endpoint(auth_base, e))?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth_client,
            username: ResourceOwnerUsername::new(config.username.clone()),
            password: ResourceOwnerPassword::new(config.password.clone()),
        })
    }

    /// Exchanges the account credentials for a bearer token.
    ///
    /// The token request goes through `http_client` so it carries the same
    /// user agent as the API calls.
    pub async fn request_token(
        &self,
        http_client: &reqwest::Client,
    ) -> Result<RedditToken, CoreError> {
        debug!("Requesting Reddit access token for {}", self.username.as_str());

        let token_response = self
            .oauth_client
            .exchange_password(&self.username, &self.password)
            .request_async(|request| send_token_request(http_client.clone(), request))
            .await
            .map_err(|e| {
                let reason = match e {
                    RequestTokenError::ServerResponse(response) => response.to_string(),
                    RequestTokenError::Request(err) => format!("token request failed: {}", err),
                    RequestTokenError::Parse(err, _) => {
                        format!("unexpected token response: {}", err)
                    }
                    RequestTokenError::Other(message) => message,
                };
                error!("Reddit authentication failed: {}", reason);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
            })?;

        let lifetime = token_response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);

        info!("Authenticated with Reddit as {}", self.username.as_str());
        Ok(RedditToken {
            access_token: token_response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
        })
    }
}

async fn send_token_request(
    http_client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().to_owned();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn invalid_endpoint(base: &str, error: impl std::fmt::Display) -> CoreError {
    CoreError::InvalidInput {
        message: format!("invalid Reddit auth endpoint {}: {}", base, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let now = SystemTime::now();
        let valid = RedditToken {
            access_token: "valid".to_string(),
            expires_at: now + Duration::from_secs(3600),
        };
        let expired = RedditToken {
            access_token: "expired".to_string(),
            expires_at: now - Duration::from_secs(1),
        };

        assert!(!valid.is_expired());
        assert!(expired.is_expired());
    }

    #[test]
    fn test_rejects_malformed_auth_base() {
        let config = RedditConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "bot".to_string(),
            password: "pw".to_string(),
            user_agent: "hotpost-test/0.1".to_string(),
        };

        let result = PasswordAuthenticator::new(&config, "not a url");
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
    }
}
