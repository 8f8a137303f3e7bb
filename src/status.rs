//! Progress reporting capability passed into the core.

/// Receives progress messages from long-running operations.
///
/// The core never writes to the terminal itself; the CLI wires this to
/// stderr and tests record the messages.
pub trait StatusReporter: Send + Sync {
    /// A short progress line. An empty message clears any previous status.
    fn progress(&self, message: &str);

    /// Instructions for completing a device authorization in the browser.
    fn device_code(&self, verification_uri: &str, user_code: &str) {
        self.progress(&format!(
            "Please open the browser to {verification_uri}, and enter the code: {user_code}"
        ));
    }
}

/// Reporter that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentStatus;

impl StatusReporter for SilentStatus {
    fn progress(&self, _message: &str) {}
}
