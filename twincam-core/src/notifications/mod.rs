//! Push notifications about finished and failed jobs.
//!
//! Notifications are best effort: a failed delivery is logged and never
//! changes a job's state.
mod abstraction;
mod ntfy;

pub use abstraction::{Notification, NotificationSender};
pub use ntfy::NtfyNotificationSender;
