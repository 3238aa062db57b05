// twincam-core/tests/job_manager_tests.rs
//
// Drives JobManager end to end through the public tool traits, with a fake
// ffmpeg that writes a small file at the requested output path.

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::collections::HashMap;
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use twincam_core::external::{FfmpegProcess, FfmpegSpawner};
use twincam_core::{
    CoreError, CoreResult, DurationProbe, JobId, JobManager, JobStatus, PipelineConfigBuilder,
    PipelineMode, StreamOrder,
};

#[derive(Clone, Default)]
struct FakeSpawner {
    outputs: Arc<Mutex<Vec<PathBuf>>>,
    fail_on: Option<String>,
}

struct FakeProcess {
    exit_code: i32,
}

impl FfmpegProcess for FakeProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        if self.exit_code != 0 {
            handler(FfmpegEvent::Error("Conversion failed!".to_string()))?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(ExitStatus::from_raw(self.exit_code << 8))
    }
}

impl FfmpegSpawner for FakeSpawner {
    type Process = FakeProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let output = cmd
            .as_inner()
            .get_args()
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| CoreError::InputValidation("no output argument".to_string()))?;
        self.outputs.lock().unwrap().push(output.clone());

        let name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.fail_on.as_deref() == Some(name) {
            return Ok(FakeProcess { exit_code: 1 });
        }
        fs::write(&output, b"fake media")?;
        Ok(FakeProcess { exit_code: 0 })
    }
}

/// Durations keyed by file name.
#[derive(Default)]
struct FakeProbe {
    durations: HashMap<String, f64>,
}

impl FakeProbe {
    fn with(entries: &[(&str, f64)]) -> Self {
        Self {
            durations: entries
                .iter()
                .map(|(name, secs)| (name.to_string(), *secs))
                .collect(),
        }
    }
}

impl DurationProbe for FakeProbe {
    fn duration(&self, path: &Path) -> CoreResult<f64> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.durations
            .get(name)
            .copied()
            .ok_or_else(|| CoreError::ProbeFailure(format!("{} unknown", path.display())))
    }
}

fn uploads(prefix: &str, count: usize) -> Vec<PathBuf> {
    (1..=count)
        .map(|i| PathBuf::from(format!("/uploads/{prefix}{i}.mp4")))
        .collect()
}

fn output_names(spawner: &FakeSpawner) -> Vec<String> {
    spawner
        .outputs
        .lock()
        .unwrap()
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect()
}

#[test]
fn test_pairwise_job_runs_all_stages() {
    let dir = tempdir().unwrap();
    let spawner = FakeSpawner::default();
    let manager = JobManager::with_tools(spawner.clone(), FakeProbe::default());
    let config = PipelineConfigBuilder::new()
        .output_dir(dir.path())
        .max_width(1920)
        .build()
        .unwrap();

    let id = manager
        .create_job(config, StreamOrder::new(uploads("a", 3), uploads("b", 3)))
        .unwrap();
    let status = manager.wait(&id).unwrap();

    assert_eq!(status.status, JobStatus::Done);
    assert_eq!(status.progress, 100);
    assert_eq!(
        output_names(&spawner),
        ["pair_000.mp4", "pair_001.mp4", "pair_002.mp4", "joined.mp4", "final.mp4"]
    );
    let output = manager.get_output_path(&id).unwrap();
    assert!(output.starts_with(dir.path()));
    assert!(output.exists());
}

#[test]
fn test_concat_first_job_pads_shorter_camera() {
    let dir = tempdir().unwrap();
    let spawner = FakeSpawner::default();
    let probe = FakeProbe::with(&[("concat_a.mp4", 70.0), ("concat_b.mp4", 60.0)]);
    let manager = JobManager::with_tools(spawner.clone(), probe);
    let config = PipelineConfigBuilder::new()
        .output_dir(dir.path())
        .mode(PipelineMode::ConcatenateFirst)
        .build()
        .unwrap();

    let id = manager
        .create_job(config, StreamOrder::new(uploads("a", 2), uploads("b", 4)))
        .unwrap();
    let status = manager.wait(&id).unwrap();

    assert_eq!(status.status, JobStatus::Done, "{:?}", status.error_message);
    assert_eq!(
        output_names(&spawner),
        ["concat_a.mp4", "concat_b.mp4", "padded_b.mp4", "combined.mp4", "final.mp4"]
    );
}

#[test]
fn test_concat_first_within_tolerance_skips_padding() {
    let dir = tempdir().unwrap();
    let spawner = FakeSpawner::default();
    let probe = FakeProbe::with(&[("concat_a.mp4", 65.0), ("concat_b.mp4", 60.0)]);
    let manager = JobManager::with_tools(spawner.clone(), probe);
    let config = PipelineConfigBuilder::new()
        .output_dir(dir.path())
        .mode(PipelineMode::ConcatenateFirst)
        .build()
        .unwrap();

    let id = manager
        .create_job(config, StreamOrder::new(uploads("a", 1), uploads("b", 1)))
        .unwrap();
    assert_eq!(manager.wait(&id).unwrap().status, JobStatus::Done);
    assert!(!output_names(&spawner).iter().any(|n| n.starts_with("padded_")));
}

#[test]
fn test_failing_stage_reports_error() {
    let dir = tempdir().unwrap();
    let spawner = FakeSpawner {
        fail_on: Some("joined.mp4".to_string()),
        ..FakeSpawner::default()
    };
    let manager = JobManager::with_tools(spawner, FakeProbe::default());
    let config = PipelineConfigBuilder::new()
        .output_dir(dir.path())
        .build()
        .unwrap();

    let id = manager
        .create_job(config, StreamOrder::new(uploads("a", 2), uploads("b", 2)))
        .unwrap();
    let status = manager.wait(&id).unwrap();

    assert_eq!(status.status, JobStatus::Error);
    assert_eq!(status.progress, 50);
    let message = status.error_message.unwrap();
    assert!(message.starts_with("Concatenate pairs failed"), "{message}");
    assert!(matches!(
        manager.get_output_path(&id),
        Err(CoreError::JobNotReady(_))
    ));
}

#[test]
fn test_mismatched_pairwise_lengths_rejected() {
    let dir = tempdir().unwrap();
    let spawner = FakeSpawner::default();
    let manager = JobManager::with_tools(spawner.clone(), FakeProbe::default());
    let config = PipelineConfigBuilder::new()
        .output_dir(dir.path())
        .build()
        .unwrap();

    let result = manager.create_job(config, StreamOrder::new(uploads("a", 3), uploads("b", 2)));
    assert!(matches!(result, Err(CoreError::InputValidation(_))));
    assert!(manager.list_jobs().unwrap().is_empty());
    assert!(output_names(&spawner).is_empty());
}

#[test]
fn test_unknown_job_is_not_found() {
    let manager = JobManager::with_tools(FakeSpawner::default(), FakeProbe::default());
    let id: JobId = "nope".parse().unwrap();
    assert!(matches!(manager.get_status(&id), Err(CoreError::JobNotFound(_))));
    assert!(matches!(
        manager.get_output_path(&id),
        Err(CoreError::JobNotFound(_))
    ));
}

#[test]
fn test_status_can_be_polled_from_other_threads() {
    let dir = tempdir().unwrap();
    let manager = Arc::new(JobManager::with_tools(
        FakeSpawner::default(),
        FakeProbe::default(),
    ));
    let config = PipelineConfigBuilder::new()
        .output_dir(dir.path())
        .build()
        .unwrap();
    let id = manager
        .create_job(config, StreamOrder::new(uploads("a", 4), uploads("b", 4)))
        .unwrap();

    let pollers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let id = id.clone();
            thread::spawn(move || {
                let mut last = 0;
                loop {
                    let snapshot = manager.get_status(&id).unwrap();
                    assert!(snapshot.progress >= last);
                    last = snapshot.progress;
                    if snapshot.status.is_terminal() {
                        return snapshot.status;
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    for poller in pollers {
        assert_eq!(poller.join().unwrap(), JobStatus::Done);
    }
    manager.wait(&id).unwrap();
}
