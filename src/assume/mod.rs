//! Turning a broker assumption response into a browser session or shell
//! credentials.

pub mod output;
pub mod recipient;
pub mod sts;

pub use output::{CloudCredentials, ExportShell};
pub use recipient::{SamlRecipient, AWS_SAML_RECIPIENT};
pub use sts::{AwsSdkOptions, AwsStsExchange, SamlExchange, StsCredentials};

use std::io::Write;
use std::sync::Arc;

use crate::broker::AssumptionResponse;
use crate::error::{Result, SamlToError};

/// Opens a URI in the user's browser.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, uri: &str) -> Result<()>;
}

/// [`BrowserLauncher`] using the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, uri: &str) -> Result<()> {
        webbrowser::open(uri).map_err(|err| SamlToError::Browser(err.to_string()))
    }
}

/// What [`RoleAssumptionEngine::assume`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssumeOutcome {
    BrowserOpened { uri: String },
    Credentials(CloudCredentials),
}

/// Completes a role assumption from a broker response.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use saml_to::assume::{AwsStsExchange, RoleAssumptionEngine, SystemBrowser};
/// # use saml_to::broker::AssumptionResponse;
///
/// # async fn example(response: AssumptionResponse) -> saml_to::error::Result<()> {
/// let engine = RoleAssumptionEngine::new(Arc::new(AwsStsExchange::new()), Arc::new(SystemBrowser));
/// engine.assume(&response, true, &mut std::io::stdout()).await?;
/// # Ok(())
/// # }
/// ```
pub struct RoleAssumptionEngine {
    aws: Arc<dyn SamlExchange>,
    browser: Arc<dyn BrowserLauncher>,
    shell: ExportShell,
}

impl RoleAssumptionEngine {
    pub fn new(aws: Arc<dyn SamlExchange>, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            aws,
            browser,
            shell: ExportShell::for_host(),
        }
    }

    pub fn with_shell(mut self, shell: ExportShell) -> Self {
        self.shell = shell;
        self
    }

    /// Open the browser (`headless == false`) or exchange the assertion and
    /// write export lines to `out`.
    ///
    /// Nothing is written to `out` unless all three credential values are
    /// present.
    pub async fn assume<W: Write>(
        &self,
        response: &AssumptionResponse,
        headless: bool,
        out: &mut W,
    ) -> Result<AssumeOutcome> {
        if !headless {
            return self.open_browser(response);
        }

        let credentials = match SamlRecipient::from_uri(&response.recipient) {
            SamlRecipient::Aws => self.assume_aws(response).await?,
            SamlRecipient::Unsupported(recipient) => {
                return Err(SamlToError::UnsupportedRecipient {
                    provider: response.provider.clone(),
                    recipient,
                });
            }
        };

        let rendered = credentials.render(self.shell);
        out.write_all(rendered.as_bytes())?;
        out.flush()?;
        Ok(AssumeOutcome::Credentials(credentials))
    }

    /// Open the response's browser URI.
    pub fn open_browser(&self, response: &AssumptionResponse) -> Result<AssumeOutcome> {
        let uri = response
            .browser_uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(SamlToError::BrowserUriNotSet)?;
        tracing::debug!(uri, "opening browser");
        self.browser.open(uri)?;
        Ok(AssumeOutcome::BrowserOpened {
            uri: uri.to_string(),
        })
    }

    async fn assume_aws(&self, response: &AssumptionResponse) -> Result<CloudCredentials> {
        let options = response
            .sdk_options
            .as_ref()
            .filter(|options| !is_empty_options(options))
            .ok_or(SamlToError::MissingSdkOptions)?;
        let assertion = response
            .saml_response
            .as_deref()
            .filter(|assertion| !assertion.trim().is_empty())
            .ok_or(SamlToError::MissingSamlResponse)?;
        let options: AwsSdkOptions = serde_json::from_value(options.clone()).map_err(|err| {
            SamlToError::InvalidArgument(format!("Invalid AWS sdk options from saml response: {err}"))
        })?;

        tracing::debug!(role = ?response.role, provider = %response.provider, "assuming AWS role");
        let raw = self.aws.assume_with_saml(&options, assertion).await?;
        CloudCredentials::try_from(raw)
    }
}

fn is_empty_options(options: &serde_json::Value) -> bool {
    match options {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
