//! saml-to: assume SAML-federated cloud roles with a GitHub identity
//!
//! A GitHub token obtained through the OAuth device flow authenticates the
//! user to an identity broker, which answers role assumptions with a SAML
//! assertion. The assertion is either completed in the browser or exchanged
//! with AWS STS for temporary credentials printed as shell exports.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use saml_to::assume::{AwsStsExchange, RoleAssumptionEngine, SystemBrowser};
//! use saml_to::auth::TokenStore;
//! use saml_to::broker::BrokerClient;
//! use saml_to::config::SamlToConfig;
//!
//! # async fn example() -> saml_to::error::Result<()> {
//! let config = SamlToConfig::from_env()?;
//! let token = config.token_store().load()?.ok_or(saml_to::auth::AuthError::NotLoggedIn)?;
//! let broker = BrokerClient::new(&config)?.with_token(&token);
//! let response = broker.assume_role("admin", None, None).await?;
//!
//! let engine = RoleAssumptionEngine::new(Arc::new(AwsStsExchange::new()), Arc::new(SystemBrowser));
//! engine.assume(&response, true, &mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod assume;
pub mod auth;
pub mod broker;
pub mod config;
pub mod error;
pub mod http;
pub mod status;

#[cfg(feature = "cli")]
pub mod cli;
