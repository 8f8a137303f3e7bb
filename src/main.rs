//! saml-to CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use saml_to::assume::ExportShell;
use saml_to::cli::auth::{handle_auth, handle_logout, handle_status, TerminalStatus};
use saml_to::cli::prompt::TerminalSelector;
use saml_to::cli::roles::{handle_assume, handle_list_logins, handle_list_roles, handle_login};
use saml_to::cli::setup::{handle_init, handle_show};
use saml_to::cli::{Cli, CliContext, Commands};
use saml_to::config::SamlToConfig;
use saml_to::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            std::process::exit(130);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "saml_to=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = SamlToConfig::from_env()?;
    let ctx = CliContext::new(config, Arc::new(TerminalStatus));
    let shell = cli.shell.unwrap_or_else(ExportShell::for_host);
    let mut stdout = std::io::stdout();

    match &cli.command {
        Commands::Auth(args) => handle_auth(&ctx, args).await,
        Commands::Logout => handle_logout(&ctx),
        Commands::Status => handle_status(&ctx, &mut stdout).await,
        Commands::ListRoles(args) => handle_list_roles(&ctx, args, &mut stdout).await,
        Commands::ListLogins(args) => handle_list_logins(&ctx, args, &mut stdout).await,
        Commands::Assume(args) => {
            handle_assume(&ctx, args, shell, &TerminalSelector, &mut stdout).await
        }
        Commands::Login(args) => handle_login(&ctx, args, &TerminalSelector).await,
        Commands::Init(args) => handle_init(&ctx, args, &mut stdout).await,
        Commands::Show(args) => handle_show(&ctx, args, &mut stdout).await,
    }
}
