//! Outbound alert notifications
//!
//! Severity-routed channels with per-channel delivery bookkeeping.
//! Persistence happens before dispatch and the two phases are never
//! transactional.

pub mod channel;
pub mod dispatcher;

pub use channel::{ChannelRouting, NotifyTarget};
pub use dispatcher::{format_payload, Notifier};
