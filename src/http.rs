//! Shared HTTP client construction and response helpers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};

use crate::error::{Result, SamlToError};

const USER_AGENT_VALUE: &str = concat!("saml-to-cli/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with the configured timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(SamlToError::Network)
}

/// Build headers for a Bearer-token API.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(mut val) = HeaderValue::from_str(&format!("Bearer {token}")) {
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Human-readable message from an error body.
///
/// Prefers a JSON `message` field (optionally nested under `data` or
/// `error`), falling back to the raw body.
pub fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("data").and_then(|d| d.get("message")))
            .or_else(|| value.get("error").and_then(|e| e.get("message")))
            .and_then(|m| m.as_str())
            .map(str::to_string)
    });
    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "no reason given".to_string(),
        None => body.trim().to_string(),
    }
}

/// Map a non-success status and body to an API error.
pub fn status_to_error(status: u16, body: &str) -> SamlToError {
    SamlToError::api(status, error_message(body))
}
