//! Interactive list prompts.

use std::io::IsTerminal;

use dialoguer::Select;

use crate::error::{Result, SamlToError};

/// Asks the user to pick one of several choices.
pub trait Selector: Send + Sync {
    /// Index into `choices` of the user's pick.
    fn select(&self, message: &str, choices: &[String]) -> Result<usize>;
}

/// [`Selector`] drawing an arrow-key list on stderr.
///
/// Stdout stays free for output meant to be piped or `eval`ed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSelector;

impl Selector for TerminalSelector {
    fn select(&self, message: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            return Err(SamlToError::InvalidArgument(format!(
                "Nothing to choose from: {message}"
            )));
        }
        if !is_interactive_terminal() {
            return Err(SamlToError::InvalidArgument(
                "Interactive selection requires a terminal. Pass the choice as an argument instead."
                    .to_string(),
            ));
        }

        Select::new()
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact_opt()
            .map_err(|err| SamlToError::Io(std::io::Error::other(err.to_string())))?
            .ok_or_else(|| SamlToError::InvalidArgument("No selection was made".to_string()))
    }
}

/// Whether stdin and stderr are both attached to a terminal.
pub fn is_interactive_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}
