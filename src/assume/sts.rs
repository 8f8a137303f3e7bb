//! Cloud STS exchanges that turn a SAML assertion into credentials.

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Result, SamlToError};

const DEFAULT_REGION: &str = "us-east-1";

/// `AssumeRoleWithSAML` inputs supplied by the broker in `sdkOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsSdkOptions {
    pub role_arn: String,
    pub principal_arn: String,
    #[serde(default)]
    pub duration_seconds: Option<i32>,
}

/// Credentials exactly as an STS call returned them; nothing is validated
/// yet.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StsCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for StsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Exchange of a SAML assertion for temporary AWS credentials.
#[async_trait]
pub trait SamlExchange: Send + Sync {
    async fn assume_with_saml(
        &self,
        options: &AwsSdkOptions,
        assertion: &str,
    ) -> Result<StsCredentials>;
}

/// [`SamlExchange`] backed by AWS STS `AssumeRoleWithSAML`.
///
/// The call is unsigned, so no local AWS credentials are needed. The region
/// comes from the explicit setting, then the default provider chain, then
/// `us-east-1`.
#[derive(Debug, Clone, Default)]
pub struct AwsStsExchange {
    region: Option<String>,
}

impl AwsStsExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[async_trait]
impl SamlExchange for AwsStsExchange {
    async fn assume_with_saml(
        &self,
        options: &AwsSdkOptions,
        assertion: &str,
    ) -> Result<StsCredentials> {
        let region = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .no_credentials()
            .load()
            .await;
        let client = aws_sdk_sts::Client::new(&config);

        tracing::debug!(role_arn = %options.role_arn, principal_arn = %options.principal_arn, "calling AssumeRoleWithSAML");
        let output = client
            .assume_role_with_saml()
            .role_arn(&options.role_arn)
            .principal_arn(&options.principal_arn)
            .saml_assertion(assertion)
            .set_duration_seconds(options.duration_seconds)
            .send()
            .await
            .map_err(|err| SamlToError::Sts(DisplayErrorContext(&err).to_string()))?;

        let Some(credentials) = output.credentials() else {
            return Ok(StsCredentials::default());
        };
        Ok(StsCredentials {
            access_key_id: Some(credentials.access_key_id().to_string()),
            secret_access_key: Some(credentials.secret_access_key().to_string()),
            session_token: Some(credentials.session_token().to_string()),
            expiration: DateTime::from_timestamp(credentials.expiration().secs(), 0),
        })
    }
}
