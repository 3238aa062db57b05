// ============================================================================
// twincam-core/src/pipeline/mod.rs
// ============================================================================
//
// PIPELINE: sequencing stages into a complete job
//
// KEY COMPONENTS:
// - PipelineStrategy: Pairwise or ConcatenateFirst, chosen once per job
// - StreamOrder: the two ordered camera path lists
// - ProgressTracker: maps per-stage percentages onto overall job progress
// - JobSink: where the pipeline reports progress and stage changes
//
// Stages within a job run strictly in order. While a stage runs, a scoped
// thread drains its progress channel into the job sink.

mod concat_first;
mod pairwise;


use crate::config::PipelineMode;
use crate::error::{CoreError, CoreResult};
use crate::external::{DurationProbe, FfmpegSpawner};
use crate::stages::StageRunner;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;

/// Receiver of a running pipeline's progress reports.
pub trait JobSink: Send + Sync {
    /// Overall job progress, 0-100.
    fn record_progress(&self, percent: u8);

    /// A stage is starting. `completed_steps` counts finished steps.
    fn record_stage(&self, label: &str, completed_steps: usize, total_steps: usize);
}

/// The two ordered input lists, one per camera.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamOrder {
    pub camera_a: Vec<PathBuf>,
    pub camera_b: Vec<PathBuf>,
}

impl StreamOrder {
    pub fn new(camera_a: Vec<PathBuf>, camera_b: Vec<PathBuf>) -> Self {
        Self { camera_a, camera_b }
    }

    /// Checks the lists can be processed in `mode`.
    pub fn validate(&self, mode: PipelineMode) -> CoreResult<()> {
        if self.camera_a.is_empty() || self.camera_b.is_empty() {
            return Err(CoreError::InputValidation(format!(
                "both cameras need at least one file (camera A: {}, camera B: {})",
                self.camera_a.len(),
                self.camera_b.len()
            )));
        }
        if mode == PipelineMode::Pairwise && self.camera_a.len() != self.camera_b.len() {
            return Err(CoreError::InputValidation(format!(
                "pairwise mode needs the same number of files per camera (camera A: {}, camera B: {})",
                self.camera_a.len(),
                self.camera_b.len()
            )));
        }
        Ok(())
    }
}

/// Pipeline topology for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStrategy {
    /// Combine each A/B pair, stream-copy join the pairs, compress.
    Pairwise,
    /// Re-encode-join each camera, pad the shorter, combine, compress.
    ConcatenateFirst,
}

impl PipelineStrategy {
    #[must_use]
    pub fn for_mode(mode: PipelineMode) -> Self {
        match mode {
            PipelineMode::Pairwise => Self::Pairwise,
            PipelineMode::ConcatenateFirst => Self::ConcatenateFirst,
        }
    }

    #[must_use]
    pub fn mode(self) -> PipelineMode {
        match self {
            Self::Pairwise => PipelineMode::Pairwise,
            Self::ConcatenateFirst => PipelineMode::ConcatenateFirst,
        }
    }

    /// Number of progress steps the job is divided into.
    #[must_use]
    pub fn total_steps(self, streams: &StreamOrder) -> usize {
        match self {
            Self::Pairwise => streams.camera_a.len() + 2,
            Self::ConcatenateFirst => 4,
        }
    }

    /// Runs every stage of the job and returns the final output path.
    ///
    /// Intermediates are written to `work_dir`. Stage errors come back
    /// wrapped with the failing stage's label.
    pub fn run<S: FfmpegSpawner, P: DurationProbe>(
        self,
        runner: &StageRunner<S, P>,
        streams: &StreamOrder,
        work_dir: &Path,
        sink: &dyn JobSink,
    ) -> CoreResult<PathBuf> {
        streams.validate(self.mode())?;
        let mut tracker = ProgressTracker::new(sink, self.total_steps(streams));
        log::info!(
            "Running {} pipeline: {} file(s) from camera A, {} from camera B",
            self.mode(),
            streams.camera_a.len(),
            streams.camera_b.len()
        );

        match self {
            Self::Pairwise => pairwise::run(runner, streams, work_dir, &mut tracker),
            Self::ConcatenateFirst => concat_first::run(runner, streams, work_dir, &mut tracker),
        }
    }
}

/// Overall progress after `completed` of `total` steps with the current step
/// at `stage_percent`.
#[must_use]
pub fn overall_progress(completed: usize, total: usize, stage_percent: u8) -> u8 {
    if total == 0 {
        return 0;
    }
    let fraction = f64::from(stage_percent.min(100)) / 100.0;
    let overall = (completed as f64 + fraction) / total as f64 * 100.0;
    overall.round().clamp(0.0, 100.0) as u8
}

/// Step bookkeeping for one pipeline run.
pub struct ProgressTracker<'a> {
    sink: &'a dyn JobSink,
    completed: usize,
    total: usize,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn JobSink, total: usize) -> Self {
        Self {
            sink,
            completed: 0,
            total,
        }
    }

    #[must_use]
    pub fn completed_steps(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.total
    }

    /// Runs one counted step. Its percentages are folded into overall
    /// progress while it runs; on success the step counter advances.
    pub fn run_step<T, F>(&mut self, label: &str, stage: F) -> CoreResult<T>
    where
        F: FnOnce(&Sender<u8>) -> CoreResult<T>,
    {
        log::info!("Step {}/{}: {label}", self.completed + 1, self.total);
        self.sink.record_stage(label, self.completed, self.total);

        let (completed, total, sink) = (self.completed, self.total, self.sink);
        let (tx, rx) = mpsc::channel::<u8>();
        let result = thread::scope(|scope| {
            scope.spawn(move || {
                for percent in rx {
                    sink.record_progress(overall_progress(completed, total, percent));
                }
            });
            let result = stage(&tx);
            drop(tx);
            result
        });

        let value = result.map_err(|e| e.in_stage(label))?;
        self.completed += 1;
        self.sink
            .record_progress(overall_progress(self.completed, self.total, 0));
        Ok(value)
    }

    /// Runs a stage that belongs to the transition between two steps. It
    /// neither advances the step counter nor moves overall progress.
    pub fn run_between_steps<T, F>(&mut self, label: &str, stage: F) -> CoreResult<T>
    where
        F: FnOnce(&Sender<u8>) -> CoreResult<T>,
    {
        log::info!("{label}");
        self.sink.record_stage(label, self.completed, self.total);
        let (tx, rx) = mpsc::channel::<u8>();
        drop(rx);
        stage(&tx).map_err(|e| e.in_stage(label))
    }
}
