//! GitHub device authorization flow and token storage.

pub mod clock;
pub mod device_code;
pub mod error;
pub mod github;
pub mod service;
pub mod store;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use device_code::{DeviceAuthorization, DeviceCodePoll, DeviceFlowState};
pub use error::AuthError;
pub use service::{DeviceAuthClient, DEFAULT_SCOPE, REPO_SCOPE};
pub use store::{FileTokenStore, TokenStore, TokenStoreConfig};
pub use token::Token;
