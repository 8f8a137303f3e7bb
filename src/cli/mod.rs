//! Command-line interface for saml-to.

pub mod auth;
pub mod prompt;
pub mod roles;
pub mod setup;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::assume::{
    AwsStsExchange, BrowserLauncher, ExportShell, RoleAssumptionEngine, SamlExchange, SystemBrowser,
};
use crate::auth::{Clock, DeviceAuthClient, SystemClock, TokenStore, DEFAULT_SCOPE};
use crate::broker::BrokerClient;
use crate::config::SamlToConfig;
use crate::error::Result;
use crate::status::StatusReporter;

/// saml-to CLI
#[derive(Parser, Debug)]
#[command(name = "saml-to", version, about = "Assume SAML-federated roles with your GitHub identity")]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Export syntax for credentials (posix or windows); defaults to the host
    #[arg(long, global = true)]
    pub shell: Option<ExportShell>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to GitHub with the device flow
    Auth(AuthArgs),
    /// Remove the stored GitHub token
    Logout,
    /// Show whether a GitHub token is stored and its scopes
    Status,
    /// List roles available to assume
    ListRoles(ListArgs),
    /// List providers available to log into
    ListLogins(ListArgs),
    /// Assume a role in the browser, or print credentials with --headless
    Assume(AssumeArgs),
    /// Log into a service provider in the browser
    Login(LoginArgs),
    /// Register a GitHub repository as an organization's configuration source
    Init(InitArgs),
    /// Show an organization's SAML metadata or configuration
    Show(ShowArgs),
}

/// Arguments for `saml-to auth`.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    /// OAuth scope to request
    #[arg(long, default_value = DEFAULT_SCOPE)]
    pub scope: String,
}

/// Arguments for `saml-to list-roles` and `saml-to list-logins`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Restrict to a single organization
    #[arg(long)]
    pub org: Option<String>,

    /// Bypass the broker's cache
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for `saml-to assume`.
#[derive(Parser, Debug)]
pub struct AssumeArgs {
    /// Role to assume (prompted for when omitted)
    pub role: Option<String>,

    /// Print credentials as shell exports instead of opening a browser
    #[arg(long)]
    pub headless: bool,

    #[arg(long)]
    pub org: Option<String>,

    #[arg(long)]
    pub provider: Option<String>,
}

/// Arguments for `saml-to login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Provider to log into (prompted for when omitted)
    pub provider: Option<String>,

    #[arg(long)]
    pub org: Option<String>,
}

/// Arguments for `saml-to init`.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// GitHub repository URL (https or ssh form)
    pub repo_url: String,

    /// Replace an existing registration for the organization
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `saml-to show`.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    pub what: ShowTarget,

    #[arg(long)]
    pub org: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowTarget {
    Metadata,
    Config,
}

/// Shared state for command handlers.
///
/// The clock, STS exchange and browser default to the real ones and can be
/// swapped out to run a command end to end without a terminal or AWS.
pub struct CliContext {
    pub config: SamlToConfig,
    pub status: Arc<dyn StatusReporter>,
    clock: Arc<dyn Clock>,
    sts: Arc<dyn SamlExchange>,
    browser: Arc<dyn BrowserLauncher>,
}

impl CliContext {
    pub fn new(config: SamlToConfig, status: Arc<dyn StatusReporter>) -> Self {
        let sts = match &config.aws_region {
            Some(region) => AwsStsExchange::new().with_region(region),
            None => AwsStsExchange::new(),
        };
        Self {
            config,
            status,
            clock: Arc::new(SystemClock),
            sts: Arc::new(sts),
            browser: Arc::new(SystemBrowser),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sts(mut self, sts: Arc<dyn SamlExchange>) -> Self {
        self.sts = sts;
        self
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::new(self.config.token_store())
    }

    pub fn auth_client(&self) -> Result<DeviceAuthClient> {
        Ok(DeviceAuthClient::from_config(&self.config, self.token_store())?
            .with_clock(self.clock.clone())
            .with_status(self.status.clone()))
    }

    /// Broker client carrying the stored GitHub token.
    pub fn broker(&self) -> Result<BrokerClient> {
        let token = self
            .token_store()
            .load()?
            .ok_or(crate::auth::AuthError::NotLoggedIn)?;
        Ok(BrokerClient::new(&self.config)?.with_token(&token))
    }

    pub fn engine(&self, shell: ExportShell) -> RoleAssumptionEngine {
        RoleAssumptionEngine::new(self.sts.clone(), self.browser.clone()).with_shell(shell)
    }
}

/// Render rows as a left-aligned table with a header rule.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[&str]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let rule: Vec<&str> = rule.iter().map(String::as_str).collect();

    let mut out = String::new();
    for line in [format_row(headers), format_row(&rule[..])] {
        out.push_str(&line);
        out.push('\n');
    }
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&format_row(&cells[..]));
        out.push('\n');
    }
    out
}
