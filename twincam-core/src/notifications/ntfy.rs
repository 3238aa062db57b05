// ============================================================================
// twincam-core/src/notifications/ntfy.rs
// ============================================================================
//
// NTFY IMPLEMENTATION: notifications delivered through an ntfy server
//
// The topic is configured as a single URL (`https://ntfy.sh/my-topic`) which
// is split into the server base URL and the topic name.

use super::{Notification, NotificationSender};
use crate::error::{CoreError, CoreResult};
use ntfy::DispatcherBuilder;
use ntfy::payload::{Payload, Priority as NtfyPriority};

/// Sends notifications to an ntfy topic using the blocking dispatcher.
///
/// ```rust,no_run
/// use twincam_core::notifications::{Notification, NotificationSender, NtfyNotificationSender};
///
/// let sender = NtfyNotificationSender::new("https://ntfy.sh/your_topic").unwrap();
/// sender
///     .send_notification(&Notification::JobError {
///         job_id: "k3j9x0q2m1ab".to_string(),
///         message: "Combine pair 1/2 failed".to_string(),
///     })
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NtfyNotificationSender {
    base_url: String,
    topic: String,
}

impl NtfyNotificationSender {
    /// Validates `topic_url`: it must use https and name a host and a topic.
    pub fn new(topic_url: &str) -> CoreResult<Self> {
        let after_scheme = topic_url.strip_prefix("https://").ok_or_else(|| {
            CoreError::NotificationError(format!(
                "Invalid ntfy topic URL '{topic_url}': must start with https://"
            ))
        })?;

        let (host, topic) = after_scheme.split_once('/').unwrap_or((after_scheme, ""));
        if host.is_empty() {
            return Err(CoreError::NotificationError(format!(
                "URL '{topic_url}' must have a non-empty host"
            )));
        }
        let topic = topic.trim_end_matches('/');
        if topic.is_empty() {
            return Err(CoreError::NotificationError(format!(
                "URL '{topic_url}' is missing topic path"
            )));
        }

        Ok(Self {
            base_url: format!("https://{host}"),
            topic: topic.to_string(),
        })
    }

    #[must_use]
    pub fn topic_url(&self) -> String {
        format!("{}/{}", self.base_url, self.topic)
    }
}

impl NotificationSender for NtfyNotificationSender {
    fn send_notification(&self, notification: &Notification) -> CoreResult<()> {
        let dispatcher = DispatcherBuilder::new(&self.base_url)
            .build_blocking()
            .map_err(|e| {
                CoreError::NotificationError(format!(
                    "Failed to build ntfy dispatcher for {}: {e}",
                    self.base_url
                ))
            })?;

        let priority = map_priority(notification.priority()).unwrap_or_else(|| {
            log::warn!(
                "Invalid ntfy priority value provided: {}",
                notification.priority()
            );
            NtfyPriority::Default
        });

        let tags = vec!["twincam".to_string(), notification.kind_tag().to_string()];

        let payload = Payload::new(&self.topic)
            .message(notification.message())
            .title(notification.title())
            .priority(priority)
            .tags(tags);

        dispatcher.send(&payload).map_err(|e| {
            CoreError::NotificationError(format!(
                "Failed to send ntfy notification to {}: {e}",
                self.topic_url()
            ))
        })?;
        log::debug!("Sent ntfy notification: {}", notification.title());
        Ok(())
    }
}

/// Maps a 1-5 priority onto ntfy's levels.
fn map_priority(p: u8) -> Option<NtfyPriority> {
    match p {
        1 => Some(NtfyPriority::Min),
        2 => Some(NtfyPriority::Low),
        3 => Some(NtfyPriority::Default),
        4 => Some(NtfyPriority::High),
        5 => Some(NtfyPriority::Max),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_topic_url() {
        let sender = NtfyNotificationSender::new("https://ntfy.sh/twincam-jobs").unwrap();
        assert_eq!(sender.base_url, "https://ntfy.sh");
        assert_eq!(sender.topic, "twincam-jobs");
        assert_eq!(sender.topic_url(), "https://ntfy.sh/twincam-jobs");
    }

    #[test]
    fn test_invalid_topic_urls() {
        for url in [
            "http://ntfy.sh/topic",
            "ntfy.sh/topic",
            "https:///topic",
            "https://ntfy.sh",
            "https://ntfy.sh/",
        ] {
            let result = NtfyNotificationSender::new(url);
            assert!(
                matches!(result, Err(CoreError::NotificationError(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_map_priority() {
        assert!(matches!(map_priority(1), Some(NtfyPriority::Min)));
        assert!(matches!(map_priority(5), Some(NtfyPriority::Max)));
        assert!(map_priority(0).is_none());
        assert!(map_priority(6).is_none());
    }
}
