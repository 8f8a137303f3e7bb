//! Error types for saml-to.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all saml-to operations.
#[derive(Error, Debug)]
pub enum SamlToError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Access to {target} is forbidden. Reason: {reason}")]
    Forbidden { target: String, reason: String },

    #[error("Multiple matches found for {target}. Specify the org and/or provider. Reason: {reason}")]
    AmbiguousTarget { target: String, reason: String },

    #[error("Terminal assumption is not supported for provider {provider} at recipient {recipient}")]
    UnsupportedRecipient { provider: String, recipient: String },

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Missing sdk options from saml response")]
    MissingSdkOptions,

    #[error("Missing SAML assertion from saml response")]
    MissingSamlResponse,

    #[error("Browser URI is not set.")]
    BrowserUriNotSet,

    #[error("Unable to open browser: {0}")]
    Browser(String),

    #[error("STS error: {0}")]
    Sts(String),

    #[error("GitHub user {login} is not a member of {org}")]
    OrgAccess { org: String, login: String },

    #[error("Repository {org}/{repo} does not exist or is not accessible")]
    RepositoryNotFound { org: String, repo: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SamlToError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SamlToError>;
