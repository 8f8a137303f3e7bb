//! Handlers for registering a configuration repository and inspecting an
//! organization.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;

use super::{CliContext, InitArgs, ShowArgs, ShowTarget};
use crate::error::{Result, SamlToError};

static REPO_URL: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://|ssh://git@|git@)?(?:www\.)?github\.com[:/](?P<org>[A-Za-z0-9_.-]+)/(?P<repo>[A-Za-z0-9_.-]+?)(?:\.git)?/?$",
    )
});

/// Organization and repository named by a GitHub URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub org: String,
    pub repo: String,
}

/// Parse `https://github.com/org/repo`, `git@github.com:org/repo.git` and
/// similar forms.
pub fn parse_repo_url(url: &str) -> Result<RepoRef> {
    let pattern = REPO_URL
        .as_ref()
        .map_err(|err| SamlToError::Configuration(format!("Invalid repository pattern: {err}")))?;
    let captures = pattern
        .captures(url.trim())
        .ok_or_else(|| SamlToError::InvalidArgument(format!("Invalid GitHub repository URL: {url}")))?;
    Ok(RepoRef {
        org: captures["org"].to_string(),
        repo: captures["repo"].to_string(),
    })
}

/// Handle `saml-to init`.
///
/// GitHub access to the repository is confirmed before the broker is asked
/// to register it.
pub async fn handle_init<W: Write>(ctx: &CliContext, args: &InitArgs, out: &mut W) -> Result<()> {
    let RepoRef { org, repo } = parse_repo_url(&args.repo_url)?;

    let token = ctx.auth_client()?.ensure_repo_access(&org, &repo).await?;
    let broker = crate::broker::BrokerClient::new(&ctx.config)?.with_token(&token);

    ctx.status.progress(&format!("Registering {org}/{repo}..."));
    broker.set_org_and_repo(&org, &repo, args.force).await?;

    ctx.status.progress("Fetching metadata...");
    let metadata = broker.org_metadata(&org).await?;
    tracing::debug!(org = %org, has_certificate = metadata.certificate.is_some(), "fetched org metadata");

    ctx.status.progress("Checking configuration...");
    broker.org_config(&org).await?;
    ctx.status.progress("");

    writeln!(out, "Configuration is valid!")?;
    Ok(())
}

/// Handle `saml-to show`.
pub async fn handle_show<W: Write>(ctx: &CliContext, args: &ShowArgs, out: &mut W) -> Result<()> {
    let broker = ctx.broker()?;
    match args.what {
        ShowTarget::Metadata => {
            let metadata = broker.org_metadata(&args.org).await?;
            writeln!(out, "{}", metadata.metadata_xml.trim_end())?;
        }
        ShowTarget::Config => {
            let config = broker.org_config(&args.org).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(org: &str, repo: &str) -> RepoRef {
        RepoRef {
            org: org.to_string(),
            repo: repo.to_string(),
        }
    }

    #[test]
    fn parses_https_and_ssh_forms() {
        for url in [
            "https://github.com/acme/saml-to-config",
            "https://github.com/acme/saml-to-config.git",
            "https://www.github.com/acme/saml-to-config/",
            "http://github.com/acme/saml-to-config",
            "git@github.com:acme/saml-to-config.git",
            "ssh://git@github.com/acme/saml-to-config",
            "github.com/acme/saml-to-config",
        ] {
            assert_eq!(parse_repo_url(url).unwrap(), repo("acme", "saml-to-config"), "{url}");
        }
    }

    #[test]
    fn keeps_dots_inside_repo_names() {
        assert_eq!(
            parse_repo_url("https://github.com/acme/config.v2.git").unwrap(),
            repo("acme", "config.v2")
        );
    }

    #[test]
    fn rejects_non_github_urls() {
        for url in [
            "https://gitlab.com/acme/config",
            "https://github.com/acme",
            "https://github.com/acme/config/tree/main",
            "not a url",
        ] {
            assert!(
                matches!(parse_repo_url(url), Err(SamlToError::InvalidArgument(_))),
                "{url}"
            );
        }
    }
}
