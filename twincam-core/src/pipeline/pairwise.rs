//! Pairwise topology: combine each camera pair, join the pairs, compress.

use super::{ProgressTracker, StreamOrder};
use crate::error::{CoreError, CoreResult};
use crate::external::{DurationProbe, FfmpegSpawner};
use crate::stages::{ConcatMode, StageOp, StageRunner};
use crate::utils::display_name;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) fn run<S: FfmpegSpawner, P: DurationProbe>(
    runner: &StageRunner<S, P>,
    streams: &StreamOrder,
    work_dir: &Path,
    tracker: &mut ProgressTracker<'_>,
) -> CoreResult<PathBuf> {
    let count = streams.camera_a.len();
    let mut pairs = Vec::with_capacity(count);

    for (index, (a, b)) in streams.camera_a.iter().zip(&streams.camera_b).enumerate() {
        let op = StageOp::Combine {
            left: a.clone(),
            right: b.clone(),
            output: work_dir.join(format!("pair_{index:03}.mp4")),
        };
        let label = format!("Combine pair {}/{count}", index + 1);
        let result = tracker.run_step(&label, |tx| runner.run(&op, tx))?;
        pairs.push(result.output_path);
    }

    ensure_pair_outputs(&pairs)?;

    let joined = work_dir.join("joined.mp4");
    let op = StageOp::Concatenate {
        inputs: pairs,
        output: joined.clone(),
        mode: ConcatMode::StreamCopy,
    };
    tracker.run_step("Concatenate pairs", |tx| runner.run(&op, tx))?;

    let op = StageOp::Compress {
        input: joined,
        output: work_dir.join("final.mp4"),
    };
    let result = tracker.run_step("Compress", |tx| runner.run(&op, tx))?;
    Ok(result.output_path)
}

/// Stream-copy joining is only valid because every pair was written by a
/// Combine stage with the shared intermediate encoding. Each of those
/// outputs has to be present and non-empty before the copy starts.
fn ensure_pair_outputs(pairs: &[PathBuf]) -> CoreResult<()> {
    for pair in pairs {
        let len = fs::metadata(pair).map(|m| m.len()).map_err(|_| {
            CoreError::MissingArtifact(format!("pair output {} is missing", pair.display()))
        })?;
        if len == 0 {
            return Err(CoreError::MissingArtifact(format!(
                "pair output {} is empty",
                display_name(pair)
            )));
        }
    }
    log::debug!("All {} pair outputs present", pairs.len());
    Ok(())
}
