//! Core library for combining two camera recordings into one side-by-side
//! video with ffmpeg.
//!
//! A job takes two ordered lists of input files, one per camera, and runs
//! them through a sequence of ffmpeg stages (combine, concatenate, pad,
//! compress). Two pipeline topologies are available:
//!
//! - **Pairwise**: the n-th file of camera A is combined with the n-th file of
//!   camera B, the pairs are joined without re-encoding, then compressed.
//! - **ConcatenateFirst**: each camera is joined on its own, the shorter
//!   stream is padded when the durations differ by more than the tolerance,
//!   then both are combined and compressed.
//!
//! Jobs run on worker threads owned by a [`JobManager`]; callers poll
//! [`JobManager::get_status`] and fetch the result with
//! [`JobManager::get_output_path`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use twincam_core::{JobManager, JobStatus, PipelineConfigBuilder, PipelineMode, StreamOrder};
//! use std::path::PathBuf;
//!
//! let config = PipelineConfigBuilder::new()
//!     .output_dir("/srv/twincam/jobs")
//!     .mode(PipelineMode::Pairwise)
//!     .crf(24)
//!     .max_width(1920)
//!     .build()
//!     .unwrap();
//! let streams = StreamOrder::new(
//!     vec![PathBuf::from("/uploads/a1.mp4"), PathBuf::from("/uploads/a2.mp4")],
//!     vec![PathBuf::from("/uploads/b1.mp4"), PathBuf::from("/uploads/b2.mp4")],
//! );
//!
//! let manager = JobManager::new();
//! let id = manager.create_job(config, streams).unwrap();
//! let status = manager.wait(&id).unwrap();
//! if status.status == JobStatus::Done {
//!     println!("{}", manager.get_output_path(&id).unwrap().display());
//! }
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod jobs;
pub mod notifications;
pub mod padding;
pub mod pipeline;
pub mod stages;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{PipelineConfig, PipelineConfigBuilder, PipelineMode, Preset};
pub use error::{CoreError, CoreResult, ErrorCategory};
pub use external::{CrateFfprobeExecutor, DurationProbe, check_dependency};
pub use jobs::{JobDetails, JobId, JobManager, JobSnapshot, JobStatus};
pub use notifications::{Notification, NotificationSender, NtfyNotificationSender};
pub use padding::{Camera, PaddingDecision, should_pad};
pub use pipeline::{PipelineStrategy, StreamOrder};
pub use stages::{StageOp, StageResult, StageRunner};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
