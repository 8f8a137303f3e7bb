//! Shell export rendering for temporary credentials.

use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

use super::sts::StsCredentials;
use crate::error::{Result, SamlToError};

/// Shell dialect used for the printed assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExportShell {
    /// `export NAME="VALUE"`
    Posix,
    /// `setx NAME="VALUE"`
    Windows,
}

impl ExportShell {
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Posix => "export",
            Self::Windows => "setx",
        }
    }

    /// One assignment line, without the trailing newline.
    pub fn assignment(self, name: &str, value: &str) -> String {
        let escaped = match self {
            Self::Posix => escape_posix(value),
            Self::Windows => value.replace('"', "\\\""),
        };
        format!("{} {name}=\"{escaped}\"", self.prefix())
    }
}

/// Validated temporary credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl CloudCredentials {
    /// Environment variables understood by the AWS CLI and SDKs.
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            ("AWS_ACCESS_KEY_ID", self.access_key_id.as_str()),
            ("AWS_SECRET_ACCESS_KEY", self.secret_access_key.as_str()),
            ("AWS_SESSION_TOKEN", self.session_token.as_str()),
        ]
    }

    /// Render every variable, one assignment per line.
    pub fn render(&self, shell: ExportShell) -> String {
        self.env_vars()
            .iter()
            .map(|(name, value)| shell.assignment(name, value) + "\n")
            .collect()
    }
}

impl TryFrom<StsCredentials> for CloudCredentials {
    type Error = SamlToError;

    fn try_from(raw: StsCredentials) -> Result<Self> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        match (
            present(raw.access_key_id),
            present(raw.secret_access_key),
            present(raw.session_token),
        ) {
            (Some(access_key_id), Some(secret_access_key), Some(session_token)) => Ok(Self {
                access_key_id,
                secret_access_key,
                session_token,
                expiration: raw.expiration,
            }),
            _ => Err(SamlToError::MissingCredentials),
        }
    }
}

fn escape_posix(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
