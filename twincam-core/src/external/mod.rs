// ============================================================================
// twincam-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// KEY COMPONENTS:
// - Traits for external tool interactions (FfmpegSpawner, DurationProbe)
// - Concrete implementations using ffmpeg-sidecar and ffprobe crates
// - Typed builders for commands, filter graphs and concat manifests
// - Dependency checking
//
// Consumers can provide their own trait implementations; the mocks module
// does exactly that for tests.

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Command, filter graph and concat manifest builders
pub mod ffmpeg_builder;

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Duration probing via ffprobe
pub mod ffprobe_executor;

/// Scripted spawner and probe for tests
#[cfg(test)]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_builder::{ConcatList, FfmpegCommandBuilder, FilterGraph, VideoFilterChain};
pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::{CrateFfprobeExecutor, DurationProbe};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd_name> -version` with output discarded.
///
/// # Returns
///
/// * `Ok(())` - If the command started
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

/// Determines if an `FFmpeg` error message is non-critical.
///
/// These are messages that appear at error level in stderr but do not mean
/// the encode failed.
#[must_use]
pub fn is_non_critical_ffmpeg_message(message: &str) -> bool {
    message.contains("deprecated pixel format")
        || message.contains("No accelerated colorspace conversion")
        || message.contains("automatically inserted filter")
        || message.contains("Timestamps are unset")
        || message.contains("Non-monotonic DTS")
        || message.contains("Queue input is backward")
        || message.contains("first frame is no keyframe")
}
