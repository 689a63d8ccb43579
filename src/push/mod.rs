//! Push delivery backends.

mod factory;
mod fcm_sender;
mod http_sender;
mod log_sender;
mod sender;

pub use factory::create_push_sender;
pub use fcm_sender::{validate_multicast, FcmSender, ServiceAccount, MAX_MULTICAST_TOKENS};
pub use http_sender::HttpPushSender;
pub use log_sender::LogPushSender;
pub use sender::{PushError, PushSender};
