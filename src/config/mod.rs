//! Configuration system (layered: defaults < config file < environment).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::store::{FileTokenStore, TokenStoreConfig};
use crate::error::{Result, SamlToError};

pub const DEFAULT_API_URL: &str = "https://sso.saml.to/github";
pub const DEFAULT_AUTH_URL: &str = "https://sso.saml.to/auth";
pub const DEFAULT_GITHUB_URL: &str = "https://github.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Runtime configuration for the broker, GitHub endpoints and local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlToConfig {
    /// Identity broker IdP API (roles, logins, orgs).
    pub api_url: String,
    /// Identity broker auth API (OAuth client metadata).
    pub auth_url: String,
    pub github_url: String,
    pub github_api_url: String,
    /// Directory holding the token file and `config.toml`.
    pub config_dir: PathBuf,
    pub http_timeout: Duration,
    /// Region for STS calls; unset falls back to the AWS provider chain.
    pub aws_region: Option<String>,
}

impl Default for SamlToConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            github_url: DEFAULT_GITHUB_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            config_dir: default_config_dir(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            aws_region: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    auth_url: Option<String>,
    github_url: Option<String>,
    github_api_url: Option<String>,
    http_timeout_secs: Option<u64>,
    aws_region: Option<String>,
}

impl SamlToConfig {
    /// Load from `.env`, the process environment and `config.toml`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup("SAML_TO_CONFIG_DIR") {
            config.config_dir = PathBuf::from(dir);
        }

        if let Some(file) = load_file(&config.config_dir.join(CONFIG_FILE_NAME))? {
            config.apply_file(file);
        }

        if let Some(url) = lookup("SAML_TO_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("SAML_TO_AUTH_URL") {
            config.auth_url = url;
        }
        if let Some(url) = lookup("SAML_TO_GITHUB_URL") {
            config.github_url = url;
        }
        if let Some(url) = lookup("SAML_TO_GITHUB_API_URL") {
            config.github_api_url = url;
        }
        if let Some(raw) = lookup("SAML_TO_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SamlToError::Configuration(format!(
                    "SAML_TO_HTTP_TIMEOUT_SECS must be a number of seconds, got {raw:?}"
                ))
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(region) = lookup("SAML_TO_AWS_REGION").filter(|r| !r.trim().is_empty()) {
            config.aws_region = Some(region);
        }

        Ok(config)
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Token store rooted at `config_dir`.
    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(TokenStoreConfig::new(self.config_dir.clone()))
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        if let Some(url) = file.auth_url {
            self.auth_url = url;
        }
        if let Some(url) = file.github_url {
            self.github_url = url;
        }
        if let Some(url) = file.github_api_url {
            self.github_api_url = url;
        }
        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout = Duration::from_secs(secs);
        }
        if file.aws_region.is_some() {
            self.aws_region = file.aws_region;
        }
    }
}

fn load_file(path: &Path) -> Result<Option<FileConfig>> {
    let raw = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(SamlToError::Io(err)),
    };
    let file = toml::from_str(&raw).map_err(|err| {
        SamlToError::Configuration(format!("Invalid config file {}: {err}", path.display()))
    })?;
    Ok(Some(file))
}

fn default_config_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".saml-to"))
        .unwrap_or_else(|| PathBuf::from(".saml-to"))
}
