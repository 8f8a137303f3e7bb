//! Typed HTTP client for the identity broker.

pub mod types;

pub use types::{AssumptionResponse, LoginDescriptor, OAuthDetail, OrgMetadata, RoleDescriptor};

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::auth::{AuthError, Token};
use crate::config::SamlToConfig;
use crate::error::{Result, SamlToError};
use crate::http::{bearer_headers, build_client, status_to_error};

use types::{Listing, Payload};

/// Client for the broker's auth and IdP APIs.
///
/// Calls that act on behalf of a user need a GitHub token; see
/// [`BrokerClient::with_token`].
///
/// # Example
/// ```no_run
/// use saml_to::auth::Token;
/// use saml_to::broker::BrokerClient;
/// use saml_to::config::SamlToConfig;
///
/// # async fn example() -> saml_to::error::Result<()> {
/// let config = SamlToConfig::from_env()?;
/// let broker = BrokerClient::new(&config)?.with_token(&Token::new("gho_example"));
/// for role in broker.list_roles(None, false).await? {
///     println!("{} [{}@{}]", role.role, role.provider, role.org);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrokerClient {
    client: reqwest::Client,
    api_url: String,
    auth_url: String,
    token: Option<String>,
}

impl BrokerClient {
    pub fn new(config: &SamlToConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.http_timeout)?,
            api_url: config.api_url.clone(),
            auth_url: config.auth_url.clone(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: &Token) -> Self {
        self.token = Some(token.access_token.clone());
        self
    }

    /// OAuth client metadata used to start the GitHub device flow.
    pub async fn oauth_detail(&self) -> Result<OAuthDetail> {
        let url = endpoint(&self.auth_url, &["api", "v1", "github", "oauth-detail"])?;
        self.execute(self.client.get(url)).await
    }

    pub async fn list_roles(&self, org: Option<&str>, refresh: bool) -> Result<Vec<RoleDescriptor>> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "roles"])?;
        let request = self.authorized(self.client.get(url))?.query(&listing_query(org, refresh));
        let listing: Listing<RoleDescriptor> = self.execute(request).await?;
        Ok(listing.results)
    }

    /// Request a SAML assertion for `role`.
    ///
    /// A 403 becomes [`SamlToError::Forbidden`] and a 404 becomes
    /// [`SamlToError::AmbiguousTarget`]: the broker answers 404 when the
    /// role matches more than one org/provider.
    pub async fn assume_role(
        &self,
        role: &str,
        org: Option<&str>,
        provider: Option<&str>,
    ) -> Result<AssumptionResponse> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "roles", role, "assume"])?;
        let mut query = Vec::new();
        if let Some(org) = org {
            query.push(("org", org));
        }
        if let Some(provider) = provider {
            query.push(("provider", provider));
        }
        tracing::debug!(role, ?org, ?provider, "requesting role assumption");
        let request = self.authorized(self.client.post(url))?.query(&query);
        self.execute(request)
            .await
            .map_err(|err| translate_assumption_error(role, err))
    }

    pub async fn list_logins(&self, org: Option<&str>, refresh: bool) -> Result<Vec<LoginDescriptor>> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "logins"])?;
        let request = self.authorized(self.client.get(url))?.query(&listing_query(org, refresh));
        let listing: Listing<LoginDescriptor> = self.execute(request).await?;
        Ok(listing.results)
    }

    /// Request an IdP-initiated login to `provider`. Errors translate like
    /// [`BrokerClient::assume_role`].
    pub async fn provider_login(&self, provider: &str, org: Option<&str>) -> Result<AssumptionResponse> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "logins", provider, "login"])?;
        let query: Vec<(&str, &str)> = org.map(|org| vec![("org", org)]).unwrap_or_default();
        tracing::debug!(provider, ?org, "requesting provider login");
        let request = self.authorized(self.client.post(url))?.query(&query);
        self.execute(request)
            .await
            .map_err(|err| translate_assumption_error(provider, err))
    }

    /// Register `org/repo` as the configuration source for `org`.
    pub async fn set_org_and_repo(&self, org: &str, repo: &str, force: bool) -> Result<serde_json::Value> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "orgs", org, "repos", repo])?;
        let mut request = self.authorized(self.client.post(url))?;
        if force {
            request = request.query(&[("force", "true")]);
        }
        self.execute(request).await
    }

    pub async fn org_metadata(&self, org: &str) -> Result<OrgMetadata> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "orgs", org, "metadata"])?;
        let request = self.authorized(self.client.get(url))?;
        self.execute(request).await
    }

    pub async fn org_config(&self, org: &str) -> Result<serde_json::Value> {
        let url = endpoint(&self.api_url, &["api", "v1", "idp", "orgs", org, "config"])?;
        let request = self.authorized(self.client.get(url))?;
        self.execute(request).await
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(AuthError::NotLoggedIn)?;
        Ok(request.headers(bearer_headers(token)))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %body, "broker request failed");
            return Err(status_to_error(status.as_u16(), &body));
        }
        let payload: Payload<T> = serde_json::from_str(&body)?;
        Ok(payload.into_inner())
    }
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|err| SamlToError::Configuration(format!("Invalid broker URL {base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| SamlToError::Configuration(format!("Broker URL {base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn listing_query(org: Option<&str>, refresh: bool) -> Vec<(&str, &str)> {
    let mut query = Vec::new();
    if let Some(org) = org {
        query.push(("org", org));
    }
    if refresh {
        query.push(("refresh", "true"));
    }
    query
}

fn translate_assumption_error(target: &str, err: SamlToError) -> SamlToError {
    match err {
        SamlToError::Api { status: 403, message } => SamlToError::Forbidden {
            target: target.to_string(),
            reason: message,
        },
        SamlToError::Api { status: 404, message } => SamlToError::AmbiguousTarget {
            target: target.to_string(),
            reason: message,
        },
        other => other,
    }
}
