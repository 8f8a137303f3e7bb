//! CLI auth command handlers for login, status, and logout.

use std::io::Write;

use super::{AuthArgs, CliContext};
use crate::auth::AuthError;
use crate::error::{Result, SamlToError};
use crate::status::StatusReporter;

/// [`StatusReporter`] that writes progress lines to stderr.
///
/// Progress goes to stderr so stdout stays clean for `eval $(saml-to assume
/// --headless ...)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalStatus;

impl StatusReporter for TerminalStatus {
    fn progress(&self, message: &str) {
        if !message.is_empty() {
            eprintln!("{message}");
        }
    }

    fn device_code(&self, verification_uri: &str, user_code: &str) {
        eprintln!("🔗 Visit: {verification_uri}");
        eprintln!("📋 Enter code: {user_code}");
        eprintln!("⏳ Waiting for authorization...");
    }
}

/// Handle `saml-to auth`.
pub async fn handle_auth(ctx: &CliContext, args: &AuthArgs) -> Result<()> {
    let client = ctx.auth_client()?;
    let location = client.login(&args.scope).await?;
    eprintln!("✅ Saved GitHub credentials to {}", location.display());
    Ok(())
}

/// Handle `saml-to logout`.
pub fn handle_logout(ctx: &CliContext) -> Result<()> {
    ctx.token_store().clear()?;
    eprintln!("✅ Removed stored GitHub credentials");
    Ok(())
}

/// Handle `saml-to status`.
pub async fn handle_status<W: Write>(ctx: &CliContext, out: &mut W) -> Result<()> {
    let client = ctx.auth_client()?;
    match client.stored_scopes().await {
        Ok(Some(scopes)) if scopes.is_empty() => writeln!(out, "GitHub: ✅ Logged in")?,
        Ok(Some(scopes)) => {
            writeln!(out, "GitHub: ✅ Logged in (scopes: {})", scopes.join(", "))?
        }
        Ok(None) => writeln!(out, "GitHub: ❌ Not logged in")?,
        Err(SamlToError::Auth(AuthError::NotLoggedIn)) => {
            writeln!(out, "GitHub: ⚠️  Stored token was rejected, run `saml-to auth`")?
        }
        Err(err) => return Err(err),
    }
    Ok(())
}
