use std::fmt;

/// GitHub access token issued by the device flow.
///
/// Only `access_token` is persisted; `token_type` and `scopes` are what GitHub
/// reported when the token was issued and are empty after a reload.
///
/// # Example
/// ```
/// use saml_to::auth::Token;
///
/// let token = Token::new("gho_example");
/// assert_eq!(token.access_token, "gho_example");
/// assert!(!format!("{token:?}").contains("gho_example"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: Option<String>,
    pub scopes: Option<Vec<String>>,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            scopes: None,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scopes", &self.scopes)
            .finish()
    }
}
