use thiserror::Error;

/// Errors raised by the device-authorization flow and the token store.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No GitHub token found. Run `saml-to auth` to log in")]
    NotLoggedIn,
    #[error("Authorization was denied by the user")]
    AccessDenied,
    #[error("Access token request has expired. Please re-run the `login` command")]
    Expired,
    #[error("Device authorization failed: {0}")]
    Failed(String),
    #[error("Missing scope. Expected: {expected} Actual: {actual}")]
    MissingScope { expected: String, actual: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
