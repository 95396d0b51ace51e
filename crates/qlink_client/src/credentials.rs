//! QLink account credentials.
//!
//! Supports multiple credential sources (in priority order):
//! 1. Environment variables (`QLINK_TOKEN`, `QLINK_URL`, `QLINK_INSTANCE`)
//! 2. Credentials file (`~/.qlink/credentials.json`)
//!
//! The service authenticates every request with a bearer token. An optional
//! *instance* (`hub/group/project`) scopes the account to one of the
//! providers it has access to; job limits and reservations are instance
//! specific.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default QLink API endpoint
pub const DEFAULT_API_URL: &str = "https://api.quantum.qlink.io/v1";

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing API token
    #[error("QLink API token not provided. Set the QLINK_TOKEN env var or save credentials to ~/.qlink/credentials.json")]
    MissingToken,

    /// Invalid token format
    #[error("Invalid API token format")]
    InvalidTokenFormat,

    /// Invalid service URL
    #[error("Invalid service URL '{0}'")]
    InvalidUrl(String),

    /// Invalid instance specifier
    #[error("Invalid instance '{0}': expected hub/group/project")]
    InvalidInstance(String),

    /// Authentication rejected by the server
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Credentials file read error
    #[error("Failed to read credentials file: {0}")]
    ConfigFileError(String),

    /// Credentials file parse error
    #[error("Failed to parse credentials file: {0}")]
    ConfigParseError(String),
}

/// Account instance: the hub/group/project triple a job is billed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Hub name
    pub hub: String,
    /// Group name
    pub group: String,
    /// Project name
    pub project: String,
}

impl FromStr for Instance {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [hub, group, project]
                if !hub.is_empty() && !group.is_empty() && !project.is_empty() =>
            {
                Ok(Self {
                    hub: hub.to_string(),
                    group: group.to_string(),
                    project: project.to_string(),
                })
            }
            _ => Err(AuthError::InvalidInstance(s.to_string())),
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hub, self.group, self.project)
    }
}

/// Credentials file entry (matches ~/.qlink/credentials.json format)
#[derive(Debug, Clone, Deserialize)]
struct ConfigEntry {
    /// API token
    token: String,

    /// Service URL
    #[serde(default)]
    url: Option<String>,

    /// Instance (hub/group/project)
    #[serde(default)]
    instance: Option<String>,
}

/// QLink account credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    /// API token
    token: String,

    /// Service base URL
    url: String,

    /// Optional account instance
    instance: Option<Instance>,
}

impl Credentials {
    /// Create new credentials with an API token and the default endpoint
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            url: DEFAULT_API_URL.to_string(),
            instance: None,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        let token = std::env::var("QLINK_TOKEN")
            .or_else(|_| std::env::var("QLINK_API_TOKEN"))
            .map_err(|_| AuthError::MissingToken)?;

        let url = std::env::var("QLINK_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let instance = match std::env::var("QLINK_INSTANCE") {
            Ok(raw) => Some(raw.parse()?),
            Err(_) => None,
        };

        Ok(Self {
            token,
            url,
            instance,
        })
    }

    /// Path to the credentials file (~/.qlink/credentials.json)
    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".qlink").join("credentials.json"))
    }

    /// Load credentials from the on-disk file.
    ///
    /// If `name` is provided, loads that specific named credential set.
    /// Otherwise loads the default entry (one whose key starts with
    /// "default", or the first entry).
    pub fn from_config_file(name: Option<&str>) -> Result<Self, AuthError> {
        let config_path = Self::config_path().ok_or_else(|| {
            AuthError::ConfigFileError("Could not determine home directory".into())
        })?;

        if !config_path.exists() {
            return Err(AuthError::ConfigFileError(format!(
                "Credentials file not found: {}",
                config_path.display()
            )));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AuthError::ConfigFileError(format!("{}: {}", config_path.display(), e)))?;

        let config: HashMap<String, ConfigEntry> = serde_json::from_str(&content)
            .map_err(|e| AuthError::ConfigParseError(e.to_string()))?;

        if config.is_empty() {
            return Err(AuthError::ConfigParseError(
                "No credentials found in file".into(),
            ));
        }

        let (entry_name, entry) = if let Some(requested) = name {
            config
                .iter()
                .find(|(k, _)| k.as_str() == requested)
                .ok_or_else(|| {
                    AuthError::ConfigParseError(format!("Credential '{}' not found", requested))
                })?
        } else {
            config
                .iter()
                .find(|(k, _)| k.starts_with("default"))
                .or_else(|| config.iter().next())
                .ok_or_else(|| AuthError::ConfigParseError("No credentials found".into()))?
        };

        let instance = entry
            .instance
            .as_deref()
            .map(Instance::from_str)
            .transpose()?;

        log::info!(
            "Loaded QLink credentials from {} [{}]",
            config_path.display(),
            entry_name
        );

        Ok(Self {
            token: entry.token.clone(),
            url: entry
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            instance,
        })
    }

    /// Auto-detect credentials from multiple sources.
    ///
    /// Priority order:
    /// 1. Environment variables
    /// 2. Credentials file (~/.qlink/credentials.json)
    pub fn auto_load() -> Result<Self, AuthError> {
        if let Ok(creds) = Self::from_env() {
            log::info!("Loaded QLink credentials from environment variables");
            return Ok(creds);
        }

        if let Ok(creds) = Self::from_config_file(None) {
            return Ok(creds);
        }

        Err(AuthError::MissingToken)
    }

    /// Override the service base URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the account instance
    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Get the API token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get the service base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the account instance
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Validate token and URL shape before any request is made
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if self.token.len() < 32 {
            return Err(AuthError::InvalidTokenFormat);
        }
        url::Url::parse(&self.url).map_err(|_| AuthError::InvalidUrl(self.url.clone()))?;
        Ok(())
    }
}
