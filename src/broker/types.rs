use std::fmt;

use serde::{Deserialize, Serialize};

/// OAuth client metadata published by the broker's auth API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthDetail {
    pub client_id: String,
}

/// A role the current GitHub identity may assume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    pub org: String,
    pub provider: String,
    pub role: String,
}

/// A service provider the current GitHub identity may log into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDescriptor {
    pub org: String,
    pub provider: String,
}

/// SAML container returned by a role assumption or provider login.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumptionResponse {
    pub provider: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub browser_uri: Option<String>,
    #[serde(default)]
    pub saml_response: Option<String>,
    #[serde(default)]
    pub sdk_options: Option<serde_json::Value>,
}

impl fmt::Debug for AssumptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumptionResponse")
            .field("provider", &self.provider)
            .field("role", &self.role)
            .field("recipient", &self.recipient)
            .field("browser_uri", &self.browser_uri)
            .field(
                "saml_response",
                &self.saml_response.as_ref().map(|_| "<redacted>"),
            )
            .field("sdk_options", &self.sdk_options)
            .finish()
    }
}

/// SAML IdP metadata for an organization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgMetadata {
    #[serde(default)]
    pub org: Option<String>,
    pub metadata_xml: String,
    #[serde(default)]
    pub certificate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Listing<T> {
    pub results: Vec<T>,
}

/// Broker bodies arrive either wrapped as `{ "data": T }` or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Payload<T> {
    Enveloped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Enveloped { data } => data,
            Self::Bare(value) => value,
        }
    }
}
