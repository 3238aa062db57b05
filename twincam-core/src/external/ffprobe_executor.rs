//! FFprobe integration for duration lookups.
//!
//! The pipeline needs exactly one fact from ffprobe: the container-level
//! duration of a media file. [`DurationProbe`] abstracts that lookup so tests
//! can script durations and failures.

use crate::error::{CoreError, CoreResult};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Something that can report the authoritative duration of a media file.
pub trait DurationProbe: Send + Sync {
    /// Returns the duration in seconds, or `ProbeFailure` if it cannot be determined.
    fn duration(&self, path: &Path) -> CoreResult<f64>;
}

/// [`DurationProbe`] backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl DurationProbe for CrateFfprobeExecutor {
    fn duration(&self, path: &Path) -> CoreResult<f64> {
        log::debug!("Running ffprobe (via crate) for duration on: {}", path.display());
        let metadata = ffprobe(path).map_err(|err| {
            log::error!("ffprobe failed for {}: {err:?}", path.display());
            map_ffprobe_error(err, path)
        })?;

        let raw = metadata.format.duration.as_deref().ok_or_else(|| {
            CoreError::ProbeFailure(format!(
                "{} has no container duration",
                path.display()
            ))
        })?;
        parse_duration_field(raw, path)
    }
}

/// Parses ffprobe's `format.duration` string.
pub(crate) fn parse_duration_field(raw: &str, path: &Path) -> CoreResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(CoreError::ProbeFailure(format!(
            "{} reports an unusable duration '{raw}'",
            path.display()
        ))),
    }
}

fn map_ffprobe_error(err: FfProbeError, path: &Path) -> CoreError {
    let detail = match err {
        FfProbeError::Io(io_err) => format!("could not run ffprobe: {io_err}"),
        FfProbeError::Status(output) => format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        FfProbeError::Deserialize(err) => format!("unreadable ffprobe output: {err}"),
        other => format!("{other:?}"),
    };
    CoreError::ProbeFailure(format!("{}: {detail}", path.display()))
}
