//! Client configuration
//!
//! The API root and OAuth credentials are supplied once, when the client
//! is constructed. `from_env` reads the same variables the CLI accepts.

use std::env;

use url::{Position, Url};

use crate::auth::Credentials;
use crate::error::{LaunchpadError, Result};

/// Default API root
pub const DEFAULT_API_URL: &str = "https://api.launchpad.net";

pub const ENV_API_URL: &str = "LP_API_URL";
pub const ENV_CONSUMER_KEY: &str = "LP_API_CONSUMER_KEY";
pub const ENV_TOKEN: &str = "LP_API_TOKEN";
pub const ENV_TOKEN_SECRET: &str = "LP_API_TOKEN_SECRET";

/// Configuration for a [`LaunchpadClient`](crate::LaunchpadClient)
#[derive(Debug, Clone)]
pub struct LaunchpadConfig {
    /// Scheme and host every request is sent to
    pub base_uri: Url,
    /// Anonymous access when `None`
    pub credentials: Option<Credentials>,
}

impl LaunchpadConfig {
    /// Anonymous configuration for the given API root
    pub fn new(base_uri: &str) -> Result<Self> {
        let parsed = Url::parse(base_uri).map_err(|source| LaunchpadError::InvalidUri {
            uri: base_uri.to_string(),
            source,
        })?;
        if !parsed.has_host() {
            return Err(LaunchpadError::Config(format!(
                "API URL has no host: {}",
                base_uri
            )));
        }

        Ok(Self {
            base_uri: parsed,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build from credential parts; any missing part means anonymous access
    pub fn with_optional_credentials(
        self,
        consumer_key: Option<String>,
        token_key: Option<String>,
        token_secret: Option<String>,
    ) -> Self {
        match (consumer_key, token_key, token_secret) {
            (Some(consumer_key), Some(token_key), Some(token_secret)) => {
                self.with_credentials(Credentials::new(consumer_key, token_key, token_secret))
            }
            _ => self,
        }
    }

    /// Read `LP_API_URL`, `LP_API_CONSUMER_KEY`, `LP_API_TOKEN` and
    /// `LP_API_TOKEN_SECRET` from the environment.
    pub fn from_env() -> Result<Self> {
        let base_uri = env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self::new(&base_uri)?.with_optional_credentials(
            env::var(ENV_CONSUMER_KEY).ok(),
            env::var(ENV_TOKEN).ok(),
            env::var(ENV_TOKEN_SECRET).ok(),
        ))
    }

    /// OAuth realm: the API origin with a trailing slash
    pub fn realm(&self) -> String {
        format!("{}/", &self.base_uri[..Position::BeforePath])
    }
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            base_uri: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            credentials: None,
        }
    }
}
