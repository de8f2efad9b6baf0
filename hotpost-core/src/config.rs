//! JSON configuration for a pipeline run.
//!
//! The file carries one section per component. Every key is required and
//! there are no defaults; callers hand each component only its own section.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "HOTPOST_CONFIG";

/// Reddit script-app credentials.
#[derive(Clone, Deserialize)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// PostgreSQL connection parameters.
#[derive(Clone, Deserialize)]
pub struct PostgresConfig {
    /// Host name, optionally with a `:port` suffix.
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl PostgresConfig {
    /// Builds a `postgres://` URL with user info percent-encoded.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse(&format!("postgres://{}", self.host)).map_err(|e| {
            ConfigError::InvalidValue {
                field: "postgres.host".to_string(),
                value: format!("{} ({})", self.host, e),
            }
        })?;

        url.set_username(&self.user)
            .map_err(|()| ConfigError::InvalidValue {
                field: "postgres.user".to_string(),
                value: self.user.clone(),
            })?;
        url.set_password(Some(&self.password))
            .map_err(|()| ConfigError::InvalidValue {
                field: "postgres.password".to_string(),
                value: "[REDACTED]".to_string(),
            })?;
        url.set_path(&format!("/{}", self.database));

        Ok(url.into())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub postgres: PostgresConfig,
}

impl AppConfig {
    /// Path of the config file: `$HOTPOST_CONFIG` when set, else `config.json`.
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ConfigError::InvalidFormat {
                details: format!("could not read {}: {}", path.display(), e),
            },
        })?;

        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("reddit.client_id", &self.reddit.client_id),
            ("reddit.client_secret", &self.reddit.client_secret),
            ("reddit.username", &self.reddit.username),
            ("reddit.password", &self.reddit.password),
            ("reddit.user_agent", &self.reddit.user_agent),
            ("postgres.host", &self.postgres.host),
            ("postgres.database", &self.postgres.database),
            ("postgres.user", &self.postgres.user),
            ("postgres.password", &self.postgres.password),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
