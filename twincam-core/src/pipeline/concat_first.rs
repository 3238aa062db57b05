//! ConcatenateFirst topology: join each camera on its own, align durations,
//! combine, compress.

use super::{ProgressTracker, StreamOrder};
use crate::error::CoreResult;
use crate::external::{DurationProbe, FfmpegSpawner};
use crate::padding::{apply_padding, should_pad};
use crate::stages::{ConcatMode, StageOp, StageRunner};
use std::path::{Path, PathBuf};

pub(super) fn run<S: FfmpegSpawner, P: DurationProbe>(
    runner: &StageRunner<S, P>,
    streams: &StreamOrder,
    work_dir: &Path,
    tracker: &mut ProgressTracker<'_>,
) -> CoreResult<PathBuf> {
    // Raw camera segments are variable frame rate, so both joins re-encode.
    let op = StageOp::Concatenate {
        inputs: streams.camera_a.clone(),
        output: work_dir.join("concat_a.mp4"),
        mode: ConcatMode::Reencode,
    };
    let concat_a = tracker.run_step("Concatenate camera A", |tx| runner.run(&op, tx))?;

    let op = StageOp::Concatenate {
        inputs: streams.camera_b.clone(),
        output: work_dir.join("concat_b.mp4"),
        mode: ConcatMode::Reencode,
    };
    let concat_b = tracker.run_step("Concatenate camera B", |tx| runner.run(&op, tx))?;

    let (probed_a, probed_b) = rayon::join(
        || runner.probe_result(concat_a),
        || runner.probe_result(concat_b),
    );
    let (concat_a, concat_b) = (
        probed_a.map_err(|e| e.in_stage("Probe camera A duration"))?,
        probed_b.map_err(|e| e.in_stage("Probe camera B duration"))?,
    );
    let (duration_a, duration_b) = (
        concat_a.duration.unwrap_or_default(),
        concat_b.duration.unwrap_or_default(),
    );

    let decision = should_pad(duration_a, duration_b, runner.config().pad_tolerance_secs);
    log::info!(
        "Durations: camera A {duration_a:.3}s, camera B {duration_b:.3}s, padding: {}",
        decision
            .target
            .map_or_else(|| "none".to_string(), |c| format!("camera {c} +{:.3}s", decision.amount))
    );

    let (left, right) = if decision.pad {
        let label = match decision.target {
            Some(camera) => format!("Pad camera {camera}"),
            None => "Pad".to_string(),
        };
        tracker.run_between_steps(&label, |tx| {
            apply_padding(
                runner,
                &decision,
                &concat_a.output_path,
                &concat_b.output_path,
                work_dir,
                tx,
            )
        })?
    } else {
        (concat_a.output_path, concat_b.output_path)
    };

    let combined = work_dir.join("combined.mp4");
    let op = StageOp::Combine {
        left,
        right,
        output: combined.clone(),
    };
    tracker.run_step("Combine cameras", |tx| runner.run(&op, tx))?;

    let op = StageOp::Compress {
        input: combined,
        output: work_dir.join("final.mp4"),
    };
    let result = tracker.run_step("Compress", |tx| runner.run(&op, tx))?;
    Ok(result.output_path)
}
