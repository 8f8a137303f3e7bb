use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::clock::{Clock, SystemClock};
use super::device_code::{DeviceAuthorization, DeviceCodePoll, DeviceFlowState};
use super::error::AuthError;
use super::github::GitHubDeviceAuth;
use super::store::TokenStore;
use super::token::Token;
use crate::broker::BrokerClient;
use crate::config::SamlToConfig;
use crate::error::{Result, SamlToError};
use crate::http::build_client;
use crate::status::{SilentStatus, StatusReporter};

/// Scope requested when the caller has no specific need.
pub const DEFAULT_SCOPE: &str = "user:email";

/// Scope needed to read and register configuration repositories.
pub const REPO_SCOPE: &str = "repo";

/// Added to the poll interval on `slow_down` when GitHub names no interval.
pub const SLOW_DOWN_INCREMENT_SECS: u64 = 5;

/// Device-flow logins attempted by [`DeviceAuthClient::ensure_scope`] before
/// giving up.
const MAX_SCOPE_LOGINS: u32 = 1;

/// Drives the GitHub device authorization grant and persists the result.
///
/// Only one `poll` per authorization should run at a time; the CLI performs a
/// single login per invocation so this is not enforced.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use saml_to::auth::service::{DeviceAuthClient, DEFAULT_SCOPE};
/// use saml_to::config::SamlToConfig;
///
/// # async fn example() -> saml_to::error::Result<()> {
/// let config = SamlToConfig::from_env()?;
/// let client = DeviceAuthClient::from_config(&config, Arc::new(config.token_store()))?;
/// let location = client.login(DEFAULT_SCOPE).await?;
/// println!("Saved GitHub credentials to {}", location.display());
/// # Ok(())
/// # }
/// ```
pub struct DeviceAuthClient {
    broker: BrokerClient,
    github: GitHubDeviceAuth,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    status: Arc<dyn StatusReporter>,
}

enum ScopeCheck {
    Granted(Token),
    Missing(AuthError),
}

impl DeviceAuthClient {
    pub fn new(broker: BrokerClient, github: GitHubDeviceAuth, store: Arc<dyn TokenStore>) -> Self {
        Self {
            broker,
            github,
            store,
            clock: Arc::new(SystemClock),
            status: Arc::new(SilentStatus),
        }
    }

    pub fn from_config(config: &SamlToConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let github = GitHubDeviceAuth::new(
            build_client(config.http_timeout)?,
            &config.github_url,
            &config.github_api_url,
        );
        Ok(Self::new(BrokerClient::new(config)?, github, store))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_status(mut self, status: Arc<dyn StatusReporter>) -> Self {
        self.status = status;
        self
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Start a device authorization for `scope` and show the user code.
    pub async fn initiate(&self, scope: &str) -> Result<DeviceAuthorization> {
        self.status.progress("Fetching GitHub OAuth details...");
        let detail = self.broker.oauth_detail().await?;
        let authorization = self
            .github
            .request_device_code(&detail.client_id, scope, self.clock.now())
            .await?;
        tracing::debug!(
            scope,
            state = ?DeviceFlowState::Requested,
            interval_secs = authorization.interval_secs,
            expires_at = %authorization.expires_at,
            "device authorization requested"
        );
        self.status.progress("");
        self.status
            .device_code(&authorization.verification_uri, &authorization.user_code);
        Ok(authorization)
    }

    /// Poll until GitHub issues a token or the authorization ends.
    ///
    /// Every request is preceded by a wait of the current interval, and no
    /// request is issued once `expires_at` has been reached. A wait never runs
    /// past `expires_at`.
    pub async fn poll(&self, authorization: &DeviceAuthorization) -> Result<Token> {
        let mut interval = authorization.interval_secs.max(1);
        let mut state = DeviceFlowState::Polling;
        loop {
            if self.clock.now() >= authorization.expires_at {
                tracing::debug!(from = ?state, to = ?DeviceFlowState::Expired, "device flow transition");
                return Err(AuthError::Expired.into());
            }
            self.clock
                .sleep(wait_before_request(interval, self.clock.now(), authorization.expires_at))
                .await;
            if self.clock.now() >= authorization.expires_at {
                tracing::debug!(from = ?state, to = ?DeviceFlowState::Expired, "device flow transition");
                return Err(AuthError::Expired.into());
            }

            let poll = match self.github.poll_once(authorization).await {
                Ok(poll) => poll,
                Err(err) => {
                    tracing::debug!(from = ?state, to = ?DeviceFlowState::Failed, error = %err, "device flow transition");
                    return Err(err.into());
                }
            };
            let next = DeviceFlowState::after(&poll);
            if next != state {
                tracing::debug!(from = ?state, to = ?next, "device flow transition");
                state = next;
            }

            match poll {
                DeviceCodePoll::Pending => continue,
                DeviceCodePoll::SlowDown { interval_secs } => {
                    interval = next_interval(interval, interval_secs);
                    tracing::debug!(interval_secs = interval, "GitHub asked to slow down");
                }
                DeviceCodePoll::Authorized { token } => return Ok(token),
                DeviceCodePoll::AccessDenied => return Err(AuthError::AccessDenied.into()),
                DeviceCodePoll::Expired => return Err(AuthError::Expired.into()),
            }
        }
    }

    /// Run the full device flow for `scope` and persist the token.
    ///
    /// Returns where the token was stored.
    pub async fn login(&self, scope: &str) -> Result<PathBuf> {
        let authorization = self.initiate(scope).await?;
        let token = self.poll(&authorization).await?;
        let location = self.store.save(&token)?;
        Ok(location)
    }

    /// Return a stored token that carries `scope`, logging in again if needed.
    ///
    /// At most one device-flow login is attempted; if the scope is still
    /// missing afterwards the check fails with [`AuthError::MissingScope`].
    pub async fn ensure_scope(&self, scope: &str) -> Result<Token> {
        let mut logins = 0;
        loop {
            self.status.progress("Checking scopes...");
            let missing = match self.check_scope(scope).await? {
                ScopeCheck::Granted(token) => {
                    self.status.progress("");
                    return Ok(token);
                }
                ScopeCheck::Missing(err) => err,
            };
            if logins >= MAX_SCOPE_LOGINS {
                return Err(missing.into());
            }
            tracing::debug!(error = %missing, scope, "re-authenticating for scope");
            self.status
                .progress(&format!("GitHub access with the `{scope}` scope is needed"));
            logins += 1;
            self.login(scope).await?;
        }
    }

    /// Confirm the stored identity can see `org/repo`, logging in with the
    /// `repo` scope when needed.
    ///
    /// Accounts other than `org` itself must be members of `org`.
    pub async fn ensure_repo_access(&self, org: &str, repo: &str) -> Result<Token> {
        let token = self.ensure_scope(REPO_SCOPE).await?;

        self.status.progress(&format!("Checking access to {org}/{repo}..."));
        let login = self.github.user_login(&token).await?;
        if !login.eq_ignore_ascii_case(org) {
            self.status
                .progress(&format!("Checking membership on {org}/{repo}..."));
            if !self.github.is_org_member(&token, org, &login).await? {
                return Err(SamlToError::OrgAccess {
                    org: org.to_string(),
                    login,
                });
            }
        }

        if !self.github.repo_exists(&token, org, repo).await? {
            return Err(SamlToError::RepositoryNotFound {
                org: org.to_string(),
                repo: repo.to_string(),
            });
        }
        self.status.progress("");
        Ok(token)
    }

    /// Scopes granted to the stored token, or `None` when nothing is stored.
    pub async fn stored_scopes(&self) -> Result<Option<Vec<String>>> {
        let Some(token) = self.store.load()? else {
            return Ok(None);
        };
        Ok(Some(self.github.token_scopes(&token).await?))
    }

    async fn check_scope(&self, scope: &str) -> Result<ScopeCheck> {
        let Some(token) = self.store.load()? else {
            return Ok(ScopeCheck::Missing(AuthError::NotLoggedIn));
        };
        match self.github.token_scopes(&token).await {
            Ok(scopes) if scopes.iter().any(|granted| granted == scope) => {
                Ok(ScopeCheck::Granted(token))
            }
            Ok(scopes) => Ok(ScopeCheck::Missing(AuthError::MissingScope {
                expected: scope.to_string(),
                actual: scopes.join(","),
            })),
            Err(AuthError::NotLoggedIn) => Ok(ScopeCheck::Missing(AuthError::NotLoggedIn)),
            Err(err) => Err(err.into()),
        }
    }
}

/// Time to wait before the next request: the interval, cut short at expiry.
pub fn wait_before_request(
    interval_secs: u64,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Duration {
    let remaining = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
    Duration::from_secs(interval_secs).min(remaining)
}

/// Interval after a `slow_down`: GitHub's suggestion when it grows the
/// interval, otherwise the current interval plus the default increment.
pub fn next_interval(current_secs: u64, suggested_secs: Option<u64>) -> u64 {
    match suggested_secs {
        Some(suggested) if suggested > current_secs => suggested,
        _ => current_secs + SLOW_DOWN_INCREMENT_SECS,
    }
}
