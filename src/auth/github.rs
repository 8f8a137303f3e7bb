use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::auth::device_code::{DeviceAuthorization, DeviceCodePoll};
use crate::auth::error::AuthError;
use crate::auth::token::Token;
use crate::http::bearer_headers;

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SCOPES_HEADER: &str = "x-oauth-scopes";

/// HTTP side of the GitHub device flow: one request per call, no waiting.
///
/// # Example
/// ```no_run
/// use saml_to::auth::github::GitHubDeviceAuth;
///
/// let github = GitHubDeviceAuth::new(
///     reqwest::Client::new(),
///     "https://github.com",
///     "https://api.github.com",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct GitHubDeviceAuth {
    client: reqwest::Client,
    device_code_url: String,
    access_token_url: String,
    api_url: String,
    user_url: String,
}

impl GitHubDeviceAuth {
    pub fn new(client: reqwest::Client, github_url: &str, github_api_url: &str) -> Self {
        let github_url = github_url.trim_end_matches('/');
        let github_api_url = github_api_url.trim_end_matches('/');
        Self {
            client,
            device_code_url: format!("{github_url}/login/device/code"),
            access_token_url: format!("{github_url}/login/oauth/access_token"),
            api_url: github_api_url.to_string(),
            user_url: format!("{github_api_url}/user"),
        }
    }

    /// Request a device/user code pair for `scope`.
    ///
    /// `now` anchors the absolute expiry of the returned authorization.
    pub async fn request_device_code(
        &self,
        client_id: &str,
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<DeviceAuthorization, AuthError> {
        let resp = self
            .client
            .post(&self.device_code_url)
            .header("Accept", "application/json")
            .form(&[("client_id", client_id), ("scope", scope)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Device code request failed with status {}",
                resp.status()
            )));
        }
        let payload: DeviceCodeResponse = resp.json().await?;
        let expires_at = expiry_after(now, payload.expires_in).ok_or_else(|| {
            AuthError::InvalidResponse(format!(
                "Device code lifetime of {} seconds is out of range",
                payload.expires_in
            ))
        })?;
        Ok(DeviceAuthorization {
            client_id: client_id.to_string(),
            device_code: payload.device_code,
            user_code: payload.user_code,
            verification_uri: payload.verification_uri,
            expires_at,
            interval_secs: payload.interval.max(1),
        })
    }

    /// Issue a single access-token request and classify the answer.
    pub async fn poll_once(
        &self,
        authorization: &DeviceAuthorization,
    ) -> Result<DeviceCodePoll, AuthError> {
        let resp = self
            .client
            .post(&self.access_token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", authorization.client_id.as_str()),
                ("device_code", authorization.device_code.as_str()),
                ("grant_type", DEVICE_GRANT_TYPE),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Device token request failed with status {}",
                resp.status()
            )));
        }
        let payload: AccessTokenResponse = resp.json().await?;
        if let Some(access_token) = payload.access_token {
            return Ok(DeviceCodePoll::Authorized {
                token: Token {
                    access_token,
                    token_type: payload.token_type,
                    scopes: payload.scope.as_deref().map(parse_scopes),
                },
            });
        }
        match payload.error.as_deref() {
            Some("authorization_pending") => Ok(DeviceCodePoll::Pending),
            Some("slow_down") => Ok(DeviceCodePoll::SlowDown {
                interval_secs: payload.interval,
            }),
            Some("expired_token") => Ok(DeviceCodePoll::Expired),
            Some("access_denied") => Ok(DeviceCodePoll::AccessDenied),
            Some(other) => Err(AuthError::Failed(
                payload
                    .error_description
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| other.to_string()),
            )),
            None => Err(AuthError::InvalidResponse(
                "Device token response missing token and error".to_string(),
            )),
        }
    }

    /// Scopes granted to `token`, read from GitHub's `X-OAuth-Scopes` header.
    ///
    /// A 401 means the token is revoked or invalid and maps to
    /// [`AuthError::NotLoggedIn`].
    pub async fn token_scopes(&self, token: &Token) -> Result<Vec<String>, AuthError> {
        let resp = self.api_get(&self.user_url, token).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::NotLoggedIn);
        }
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "GitHub user request failed with status {}",
                resp.status()
            )));
        }
        let header = resp
            .headers()
            .get(SCOPES_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        tracing::debug!(scopes = header, "current GitHub token scopes");
        Ok(parse_scopes(header))
    }

    /// Login name of the account that owns `token`.
    pub async fn user_login(&self, token: &Token) -> Result<String, AuthError> {
        let resp = self.api_get(&self.user_url, token).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::NotLoggedIn);
        }
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "GitHub user request failed with status {}",
                resp.status()
            )));
        }
        let user: GitHubUser = resp.json().await?;
        Ok(user.login)
    }

    /// Whether `username` is a member of `org` as seen by `token`.
    pub async fn is_org_member(
        &self,
        token: &Token,
        org: &str,
        username: &str,
    ) -> Result<bool, AuthError> {
        let url = format!("{}/orgs/{org}/members/{username}", self.api_url);
        let resp = self.api_get(&url, token).await?;
        tracing::debug!(org, username, status = resp.status().as_u16(), "checked org membership");
        Ok(resp.status() == StatusCode::NO_CONTENT)
    }

    /// Whether `org/repo` exists and is visible to `token`.
    pub async fn repo_exists(&self, token: &Token, org: &str, repo: &str) -> Result<bool, AuthError> {
        let url = format!("{}/repos/{org}/{repo}", self.api_url);
        let resp = self.api_get(&url, token).await?;
        match resp.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(false),
            StatusCode::UNAUTHORIZED => Err(AuthError::NotLoggedIn),
            status => Err(AuthError::InvalidResponse(format!(
                "GitHub repository request failed with status {status}"
            ))),
        }
    }

    async fn api_get(&self, url: &str, token: &Token) -> Result<reqwest::Response, AuthError> {
        Ok(self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .headers(bearer_headers(&token.access_token))
            .send()
            .await?)
    }
}

fn expiry_after(now: DateTime<Utc>, expires_in_secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(expires_in_secs).ok()?;
    now.checked_add_signed(Duration::try_seconds(secs)?)
}

/// Split a GitHub scope list (`"repo, user:email"` or `"repo,user:email"`).
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    interval: u64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    interval: Option<u64>,
}
