use chrono::{DateTime, Utc};

use super::Token;

/// Device authorization issued by GitHub for one login attempt.
///
/// # Example
/// ```no_run
/// use saml_to::auth::DeviceAuthorization;
/// use chrono::{Duration, Utc};
///
/// let authorization = DeviceAuthorization {
///     client_id: "Iv1.0123456789abcdef".to_string(),
///     device_code: "3584d83530557fdd1f46af8289938c8ef79f9dc5".to_string(),
///     user_code: "WDJB-MJHT".to_string(),
///     verification_uri: "https://github.com/login/device".to_string(),
///     expires_at: Utc::now() + Duration::seconds(900),
///     interval_secs: 5,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DeviceAuthorization {
    pub client_id: String,
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_at: DateTime<Utc>,
    pub interval_secs: u64,
}

/// Outcome of a single token request.
#[derive(Debug, Clone)]
pub enum DeviceCodePoll {
    Pending,
    /// Provider asked to back off, optionally naming a new interval.
    SlowDown { interval_secs: Option<u64> },
    Authorized { token: Token },
    AccessDenied,
    Expired,
}

/// Lifecycle of a device-authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFlowState {
    Requested,
    Polling,
    Succeeded,
    Expired,
    Denied,
    Failed,
}

impl DeviceFlowState {
    /// State reached after observing `poll` while polling.
    pub fn after(poll: &DeviceCodePoll) -> Self {
        match poll {
            DeviceCodePoll::Pending | DeviceCodePoll::SlowDown { .. } => Self::Polling,
            DeviceCodePoll::Authorized { .. } => Self::Succeeded,
            DeviceCodePoll::AccessDenied => Self::Denied,
            DeviceCodePoll::Expired => Self::Expired,
        }
    }
}
