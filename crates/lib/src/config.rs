//! Client configuration: where the remote store lives and which application
//! the client speaks for.
//!
//! A configuration is built directly with [`ClientConfig::new`], read from the
//! `NIMBUS_SERVER_URL` / `NIMBUS_APPLICATION_ID` environment variables, or
//! parsed from JSON:
//!
//! ```
//! # use nimbus::config::ClientConfig;
//! let config = ClientConfig::from_json(
//!     r#"{"serverUrl": "https://api.example.com/v1", "applicationId": "demo"}"#,
//! ).unwrap();
//! assert_eq!(
//!     config.endpoint("classes/Post").unwrap().as_str(),
//!     "https://api.example.com/v1/classes/Post"
//! );
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::constants::{ENV_APPLICATION_ID, ENV_SERVER_URL};

/// Errors raised while building a [`ClientConfig`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required setting was absent or empty
    #[error("Missing configuration setting '{setting}'")]
    MissingSetting { setting: &'static str },

    /// The server URL could not be parsed or is not http(s)
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// Connection settings for a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    server_url: Url,
    application_id: String,
}

impl ClientConfig {
    pub fn new(server_url: &str, application_id: impl Into<String>) -> Result<Self, ConfigError> {
        let server_url = Url::parse(server_url).map_err(|err| ConfigError::InvalidServerUrl {
            url: server_url.to_string(),
            reason: err.to_string(),
        })?;
        Self::validated(server_url, application_id.into())
    }

    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url = env_setting(ENV_SERVER_URL)?;
        let application_id = env_setting(ENV_APPLICATION_ID)?;
        Self::new(&server_url, application_id)
    }

    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)?;
        Ok(Self::validated(config.server_url, config.application_id)?)
    }

    fn validated(mut server_url: Url, application_id: String) -> Result<Self, ConfigError> {
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidServerUrl {
                url: server_url.to_string(),
                reason: format!("unsupported scheme '{}'", server_url.scheme()),
            });
        }
        if application_id.trim().is_empty() {
            return Err(ConfigError::MissingSetting {
                setting: "applicationId",
            });
        }
        // Url::join replaces the last path segment unless the base ends in '/'
        if !server_url.path().ends_with('/') {
            let path = format!("{}/", server_url.path());
            server_url.set_path(&path);
        }
        Ok(Self {
            server_url,
            application_id,
        })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Resolves `path` against the server URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.server_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ConfigError::InvalidServerUrl {
                url: self.server_url.to_string(),
                reason: err.to_string(),
            })
    }
}

fn env_setting(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSetting { setting: name }),
    }
}
