// ============================================================================
// twincam-core/src/notifications/abstraction.rs
// ============================================================================
//
// NOTIFICATION ABSTRACTION: what gets announced and who can send it
//
// KEY COMPONENTS:
// - Notification: job completion or job failure
// - NotificationSender: trait implemented by notification backends

use crate::error::CoreResult;
use crate::utils::display_name;
use std::path::PathBuf;
use std::time::Duration;

/// A message about a job's outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A job finished and produced its output file
    JobComplete {
        job_id: String,
        output_path: PathBuf,
        elapsed: Duration,
    },

    /// A job stopped with an error
    JobError { job_id: String, message: String },
}

impl Notification {
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::JobComplete { .. } => "Video Ready".to_string(),
            Self::JobError { .. } => "Video Processing Failed".to_string(),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::JobComplete {
                job_id,
                output_path,
                elapsed,
            } => format!(
                "Job {job_id} finished {} in {}",
                display_name(output_path),
                format_elapsed(*elapsed)
            ),
            Self::JobError { job_id, message } => format!("Job {job_id} failed: {message}"),
        }
    }

    /// Priority level (1-5, with 5 being highest).
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::JobComplete { .. } => 4,
            Self::JobError { .. } => 5,
        }
    }

    /// Tag identifying the kind of notification.
    #[must_use]
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::JobComplete { .. } => "complete",
            Self::JobError { .. } => "error",
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Backend that can deliver a [`Notification`].
pub trait NotificationSender: Send + Sync {
    fn send_notification(&self, notification: &Notification) -> CoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_complete_message() {
        let notification = Notification::JobComplete {
            job_id: "abc123".to_string(),
            output_path: PathBuf::from("/out/abc123/final.mp4"),
            elapsed: Duration::from_secs(3725),
        };
        assert_eq!(notification.title(), "Video Ready");
        assert_eq!(
            notification.message(),
            "Job abc123 finished final.mp4 in 1h 2m 5s"
        );
        assert_eq!(notification.priority(), 4);
        assert_eq!(notification.kind_tag(), "complete");
    }

    #[test]
    fn test_job_error_message() {
        let notification = Notification::JobError {
            job_id: "abc123".to_string(),
            message: "Compress failed: boom".to_string(),
        };
        assert_eq!(notification.message(), "Job abc123 failed: Compress failed: boom");
        assert_eq!(notification.priority(), 5);
        assert_eq!(notification.kind_tag(), "error");
    }
}
