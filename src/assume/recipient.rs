/// Assertion consumer URL of the AWS SAML sign-in endpoint.
pub const AWS_SAML_RECIPIENT: &str = "https://signin.aws.amazon.com/saml";

/// SAML consumer a broker assertion is addressed to.
///
/// Only recipients with a known terminal exchange get a variant; everything
/// else lands in `Unsupported`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamlRecipient {
    Aws,
    Unsupported(String),
}

impl SamlRecipient {
    pub fn from_uri(uri: &str) -> Self {
        match uri.trim() {
            AWS_SAML_RECIPIENT => Self::Aws,
            other => Self::Unsupported(other.to_string()),
        }
    }
}
