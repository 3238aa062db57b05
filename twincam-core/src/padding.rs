//! Duration alignment between the two camera streams.
//!
//! When one camera's feed is noticeably shorter, its last frame is held and
//! silence appended so that both halves of the side-by-side output end
//! together.

use crate::error::CoreResult;
use crate::external::{DurationProbe, FfmpegSpawner};
use crate::stages::{StageOp, StageRunner};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// One of the two camera streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Camera {
    A,
    B,
}

impl Camera {
    fn tag(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Outcome of [`should_pad`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddingDecision {
    pub pad: bool,
    /// The shorter stream, when padding is needed.
    pub target: Option<Camera>,
    /// Seconds to add to `target`; 0 when no padding is needed.
    pub amount: f64,
}

impl PaddingDecision {
    const NONE: Self = Self {
        pad: false,
        target: None,
        amount: 0.0,
    };
}

/// Decides whether the shorter stream needs padding.
///
/// Padding is required only when the difference strictly exceeds
/// `tolerance`; the shorter stream then receives exactly the difference.
#[must_use]
pub fn should_pad(duration_a: f64, duration_b: f64, tolerance: f64) -> PaddingDecision {
    let diff = (duration_a - duration_b).abs();
    if !diff.is_finite() || diff <= tolerance {
        return PaddingDecision::NONE;
    }
    let target = if duration_a < duration_b {
        Camera::A
    } else {
        Camera::B
    };
    PaddingDecision {
        pad: true,
        target: Some(target),
        amount: diff,
    }
}

/// Applies `decision` to the pair of concatenated streams.
///
/// Returns the `(a, b)` paths to use for the combine step: unchanged when no
/// padding is needed, otherwise with the shorter one replaced by its padded
/// variant `padded_<a|b>.mp4` in `work_dir`.
pub fn apply_padding<S: FfmpegSpawner, P: DurationProbe>(
    runner: &StageRunner<S, P>,
    decision: &PaddingDecision,
    stream_a: &Path,
    stream_b: &Path,
    work_dir: &Path,
    progress: &Sender<u8>,
) -> CoreResult<(PathBuf, PathBuf)> {
    let (a, b) = (stream_a.to_path_buf(), stream_b.to_path_buf());
    let Some(target) = decision.target.filter(|_| decision.pad) else {
        log::info!("Stream durations within tolerance, no padding needed");
        return Ok((a, b));
    };

    log::info!(
        "Padding camera {target} by {:.3}s to match the longer stream",
        decision.amount
    );
    let input = match target {
        Camera::A => &a,
        Camera::B => &b,
    };
    let op = StageOp::Pad {
        input: input.clone(),
        output: work_dir.join(format!("padded_{}.mp4", target.tag())),
        seconds: decision.amount,
    };
    let padded = runner.run(&op, progress)?.output_path;

    Ok(match target {
        Camera::A => (padded, b),
        Camera::B => (a, padded),
    })
}
