//! Handlers for listing, assuming and logging into roles.

use std::io::Write;

use super::prompt::Selector;
use super::{render_table, AssumeArgs, CliContext, ListArgs, LoginArgs};
use crate::assume::{AssumeOutcome, ExportShell};
use crate::auth::DEFAULT_SCOPE;
use crate::broker::{LoginDescriptor, RoleDescriptor};
use crate::error::{Result, SamlToError};

/// Choice offered by `saml-to login` to switch GitHub identities.
pub const NEW_IDENTITY_CHOICE: &str = "[New GitHub Identity]";

/// Handle `saml-to list-roles`.
pub async fn handle_list_roles<W: Write>(ctx: &CliContext, args: &ListArgs, out: &mut W) -> Result<()> {
    let roles = ctx.broker()?.list_roles(args.org.as_deref(), args.refresh).await?;
    if roles.is_empty() {
        writeln!(out, "No roles are available to assume")?;
        return Ok(());
    }
    let rows: Vec<Vec<String>> = roles
        .iter()
        .map(|r| vec![r.org.clone(), r.provider.clone(), r.role.clone()])
        .collect();
    write!(out, "{}", render_table(&["Org", "Provider", "Role"], &rows))?;
    Ok(())
}

/// Handle `saml-to list-logins`.
pub async fn handle_list_logins<W: Write>(ctx: &CliContext, args: &ListArgs, out: &mut W) -> Result<()> {
    let logins = ctx.broker()?.list_logins(args.org.as_deref(), args.refresh).await?;
    if logins.is_empty() {
        writeln!(out, "No providers are available to log into")?;
        return Ok(());
    }
    let rows: Vec<Vec<String>> = logins
        .iter()
        .map(|l| vec![l.org.clone(), l.provider.clone()])
        .collect();
    write!(out, "{}", render_table(&["Org", "Provider"], &rows))?;
    Ok(())
}

/// Handle `saml-to assume`.
///
/// Credentials for `--headless` go to `out`; everything else goes to stderr.
pub async fn handle_assume<W: Write>(
    ctx: &CliContext,
    args: &AssumeArgs,
    shell: ExportShell,
    selector: &dyn Selector,
    out: &mut W,
) -> Result<()> {
    let broker = ctx.broker()?;

    let (role, org, provider) = match &args.role {
        Some(role) => (role.clone(), args.org.clone(), args.provider.clone()),
        None if args.headless => {
            return Err(SamlToError::InvalidArgument(
                "Please specify a role to assume".to_string(),
            ));
        }
        None => {
            ctx.status.progress("Fetching roles...");
            let roles = broker.list_roles(args.org.as_deref(), false).await?;
            ctx.status.progress("");
            let picked = pick_role(&roles, selector)?;
            (picked.role, Some(picked.org), Some(picked.provider))
        }
    };

    ctx.status.progress(&format!("Assuming {role}..."));
    let response = broker
        .assume_role(&role, org.as_deref(), provider.as_deref())
        .await?;
    ctx.status.progress("");

    match ctx.engine(shell).assume(&response, args.headless, out).await? {
        AssumeOutcome::BrowserOpened { uri } => {
            ctx.status.progress(&format!("Opened {uri}"));
        }
        AssumeOutcome::Credentials(credentials) => {
            tracing::debug!(expiration = ?credentials.expiration, "credentials written");
        }
    }
    Ok(())
}

/// Handle `saml-to login`.
///
/// Choosing [`NEW_IDENTITY_CHOICE`] runs the device flow and prompts again
/// with the new identity's providers.
pub async fn handle_login(ctx: &CliContext, args: &LoginArgs, selector: &dyn Selector) -> Result<()> {
    let (provider, org) = match &args.provider {
        Some(provider) => (provider.clone(), args.org.clone()),
        None => loop {
            ctx.status.progress("Fetching logins...");
            let logins = ctx.broker()?.list_logins(args.org.as_deref(), false).await?;
            ctx.status.progress("");
            match pick_login(&logins, selector)? {
                Some(login) => break (login.provider, Some(login.org)),
                None => {
                    ctx.auth_client()?.login(DEFAULT_SCOPE).await?;
                }
            }
        },
    };

    ctx.status.progress(&format!("Logging into {provider}..."));
    let response = ctx.broker()?.provider_login(&provider, org.as_deref()).await?;
    ctx.status.progress("");

    let engine = ctx.engine(ExportShell::for_host());
    if let AssumeOutcome::BrowserOpened { uri } = engine.open_browser(&response)? {
        ctx.status.progress(&format!("Opened {uri}"));
    }
    Ok(())
}

/// Ask the user to pick a role.
pub fn pick_role(roles: &[RoleDescriptor], selector: &dyn Selector) -> Result<RoleDescriptor> {
    if roles.is_empty() {
        return Err(SamlToError::InvalidArgument(
            "No roles are available to assume".to_string(),
        ));
    }
    let choices: Vec<String> = roles
        .iter()
        .map(|r| format!("{} ({}@{})", r.role, r.provider, r.org))
        .collect();
    let index = selector.select("Which role would you like to assume?", &choices)?;
    roles
        .get(index)
        .cloned()
        .ok_or_else(|| SamlToError::InvalidArgument(format!("No role at position {}", index + 1)))
}

/// Ask the user to pick a provider; `None` means a new GitHub identity.
pub fn pick_login(logins: &[LoginDescriptor], selector: &dyn Selector) -> Result<Option<LoginDescriptor>> {
    let mut choices: Vec<String> = logins
        .iter()
        .map(|l| format!("{} ({})", l.provider, l.org))
        .collect();
    choices.push(NEW_IDENTITY_CHOICE.to_string());

    let index = selector.select("Which provider would you like to log in to?", &choices)?;
    Ok(logins.get(index).cloned())
}
