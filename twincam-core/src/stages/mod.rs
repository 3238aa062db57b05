// ============================================================================
// twincam-core/src/stages/mod.rs
// ============================================================================
//
// STAGES: one external tool invocation per transcoding operation
//
// KEY COMPONENTS:
// - StageOp: Combine, Concatenate, Compress or Pad, with their paths
// - StageRunner: builds the command, runs it, forwards 0-100 progress on a
//   channel and resolves once the tool process has exited
// - StageProgressHandler: translates the tool's events into percentages
//
// A stage blocks the calling thread until the tool exits. Progress values are
// sent on an `mpsc::Sender<u8>` so the caller can consume them from another
// thread without ever blocking the tool.

pub mod args;
pub mod progress;

pub use progress::StageProgressHandler;

use crate::config::PipelineConfig;
use crate::error::{CoreError, CoreResult, command_failed_error};
use crate::external::ffmpeg_executor::command_line;
use crate::external::{ConcatList, DurationProbe, FfmpegCommandBuilder, FfmpegProcess, FfmpegSpawner};
use crate::temp_files::create_temp_file_with;
use crate::utils::{display_name, format_duration};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Instant;

/// How a Concatenate stage treats its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// Packets are copied as is. Only valid for inputs that already share
    /// codec parameters and a constant frame rate.
    StreamCopy,
    /// Inputs are decoded and re-encoded with frame-rate normalization.
    Reencode,
}

/// One transcoding operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOp {
    Combine {
        left: PathBuf,
        right: PathBuf,
        output: PathBuf,
    },
    Concatenate {
        inputs: Vec<PathBuf>,
        output: PathBuf,
        mode: ConcatMode,
    },
    Compress {
        input: PathBuf,
        output: PathBuf,
    },
    Pad {
        input: PathBuf,
        output: PathBuf,
        seconds: f64,
    },
}

impl StageOp {
    #[must_use]
    pub fn output(&self) -> &Path {
        match self {
            Self::Combine { output, .. }
            | Self::Concatenate { output, .. }
            | Self::Compress { output, .. }
            | Self::Pad { output, .. } => output,
        }
    }

    /// Short human-readable description used in logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Combine { left, right, .. } => {
                format!("combine {} + {}", display_name(left), display_name(right))
            }
            Self::Concatenate { inputs, mode, .. } => {
                let how = match mode {
                    ConcatMode::StreamCopy => "stream copy",
                    ConcatMode::Reencode => "re-encode",
                };
                format!("concatenate {} file(s) ({how})", inputs.len())
            }
            Self::Compress { input, .. } => format!("compress {}", display_name(input)),
            Self::Pad { input, seconds, .. } => {
                format!("pad {} by {seconds:.3}s", display_name(input))
            }
        }
    }
}

/// Output of a finished stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub output_path: PathBuf,
    /// Probed duration of the output, when the caller asked for it.
    pub duration: Option<f64>,
}

/// Runs single stages with the job's configuration.
pub struct StageRunner<S: FfmpegSpawner, P: DurationProbe> {
    spawner: Arc<S>,
    probe: Arc<P>,
    config: PipelineConfig,
}

impl<S: FfmpegSpawner, P: DurationProbe> StageRunner<S, P> {
    pub fn new(spawner: Arc<S>, probe: Arc<P>, config: PipelineConfig) -> Self {
        Self {
            spawner,
            probe,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fills in the probed duration of a finished stage's output.
    pub fn probe_result(&self, result: StageResult) -> CoreResult<StageResult> {
        let duration = self.probe.duration(&result.output_path)?;
        log::info!(
            "{} duration: {}",
            display_name(&result.output_path),
            format_duration(duration)
        );
        Ok(StageResult {
            duration: Some(duration),
            ..result
        })
    }

    /// Runs `op` to completion.
    ///
    /// Percentages (0-99 while the tool runs, 100 once it exited cleanly) are
    /// sent on `progress`. A dropped receiver is not an error.
    pub fn run(&self, op: &StageOp, progress: &Sender<u8>) -> CoreResult<StageResult> {
        let start = Instant::now();
        log::info!("Starting stage: {}", op.describe());

        let enc = &self.config.intermediate;
        let result = match op {
            StageOp::Combine {
                left,
                right,
                output,
            } => {
                let args = args::combine_args(left, right, output, self.config.max_width, enc)?;
                self.run_tool(op, args, None, 0.0, progress)
            }
            StageOp::Concatenate {
                inputs,
                output,
                mode,
            } => self.run_concat(op, inputs, output, *mode, progress),
            StageOp::Compress { input, output } => {
                let args = args::compress_args(input, output, &self.config);
                self.run_tool(op, args, None, 0.0, progress)
            }
            StageOp::Pad {
                input,
                output,
                seconds,
            } => {
                if !seconds.is_finite() || *seconds <= 0.0 {
                    return Err(CoreError::InputValidation(format!(
                        "padding amount must be positive, got {seconds}"
                    )));
                }
                let args = args::pad_args(input, output, *seconds, enc);
                self.run_tool(op, args, None, *seconds, progress)
            }
        };

        match &result {
            Ok(_) => log::info!(
                "Finished stage: {} in {:.1}s",
                op.describe(),
                start.elapsed().as_secs_f64()
            ),
            Err(e) => log::error!("Stage failed: {}: {e}", op.describe()),
        }
        result
    }

    fn run_concat(
        &self,
        op: &StageOp,
        inputs: &[PathBuf],
        output: &Path,
        mode: ConcatMode,
        progress: &Sender<u8>,
    ) -> CoreResult<StageResult> {
        let list = ConcatList::from_paths(inputs)?;
        if list.is_empty() {
            return Err(CoreError::InputValidation(
                "nothing to concatenate".to_string(),
            ));
        }

        let reencode = mode == ConcatMode::Reencode;
        let known_total = if reencode {
            self.total_input_duration(inputs)
        } else {
            None
        };

        let work_dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let list_file = create_temp_file_with(work_dir, "concat_list", "txt", &list.render())?;
        log::debug!("Concat list written to {}", list_file.path().display());

        let args = args::concat_args(list_file.path(), output, reencode, &self.config.intermediate);
        let result = self.run_tool(op, args, known_total, 0.0, progress);

        // Removed whether or not the stage succeeded.
        if let Err(e) = list_file.close() {
            log::warn!("Failed to remove concat list: {e}");
        }
        result
    }

    /// Sum of all input durations, or `None` if any probe fails, in which
    /// case progress falls back to what the tool reports.
    fn total_input_duration(&self, inputs: &[PathBuf]) -> Option<f64> {
        let probed: CoreResult<Vec<f64>> = inputs
            .par_iter()
            .map(|path| self.probe.duration(path))
            .collect();
        match probed {
            Ok(durations) => {
                let total: f64 = durations.iter().sum();
                log::debug!("Total input duration for concatenation: {total:.3}s");
                Some(total)
            }
            Err(e) => {
                log::warn!("Could not probe concatenation inputs, using tool progress: {e}");
                None
            }
        }
    }

    fn run_tool(
        &self,
        op: &StageOp,
        args: Vec<String>,
        known_total: Option<f64>,
        extra_secs: f64,
        progress: &Sender<u8>,
    ) -> CoreResult<StageResult> {
        let output = op.output();
        let mut cmd = FfmpegCommandBuilder::new().build(args);
        log::debug!("FFmpeg command: {}", command_line(&mut cmd));

        let mut child = self.spawner.spawn(cmd)?;
        let mut handler = StageProgressHandler::new(op.describe(), known_total, extra_secs, progress);
        child.handle_events(|event| handler.handle_event(event))?;
        let status = child.wait()?;

        if !status.success() {
            return Err(command_failed_error(
                "ffmpeg",
                status,
                handler.stderr_excerpt(),
            ));
        }
        if let Some(fatal) = handler.fatal_message() {
            return Err(CoreError::ToolReported(
                "ffmpeg".to_string(),
                fatal.to_string(),
            ));
        }
        if !output.exists() {
            return Err(CoreError::MissingArtifact(format!(
                "ffmpeg exited successfully but {} was not created",
                output.display()
            )));
        }

        let _ = progress.send(100);
        Ok(StageResult {
            output_path: output.to_path_buf(),
            duration: None,
        })
    }
}
