// ============================================================================
// twincam-core/src/jobs/mod.rs
// ============================================================================
//
// JOBS: the registry of jobs and the manager callers talk to
//
// KEY COMPONENTS:
// - JobRegistry: shared map of job records behind an RwLock
// - JobReporter: the running pipeline's handle on its own record
// - JobManager: validates and starts jobs, answers status queries
//
// Every job runs on its own worker thread. The registry is the only state
// shared between jobs. Status reads take the read lock; progress updates
// take the write lock briefly. Each record has exactly one writer, the
// pipeline driving that job.

mod registry;

pub use registry::{JobDetails, JobRegistry, JobReporter, JobSnapshot, JobStatus};

use crate::config::PipelineConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{CrateFfprobeExecutor, DurationProbe, FfmpegSpawner, SidecarSpawner};
use crate::notifications::{Notification, NotificationSender};
use crate::pipeline::{PipelineStrategy, StreamOrder};
use crate::stages::StageRunner;
use crate::temp_files::{create_job_dir, random_token};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Length of generated job ids.
const JOB_ID_LEN: usize = 12;

/// Opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    fn generate() -> Self {
        Self(random_token(JOB_ID_LEN))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl FromStr for JobId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InputValidation("job id is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Owns the job registry and starts pipelines.
///
/// Create one per process and pass it to whatever needs to start or poll
/// jobs.
pub struct JobManager<S: FfmpegSpawner = SidecarSpawner, P: DurationProbe = CrateFfprobeExecutor> {
    registry: JobRegistry,
    spawner: Arc<S>,
    probe: Arc<P>,
    notifier: Option<Arc<dyn NotificationSender>>,
    handles: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl JobManager {
    /// Manager driving the real ffmpeg and ffprobe binaries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tools(SidecarSpawner, CrateFfprobeExecutor::new())
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P> JobManager<S, P>
where
    S: FfmpegSpawner + 'static,
    P: DurationProbe + 'static,
{
    pub fn with_tools(spawner: S, probe: P) -> Self {
        Self {
            registry: JobRegistry::new(),
            spawner: Arc::new(spawner),
            probe: Arc::new(probe),
            notifier: None,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Sends a notification whenever a job finishes or fails.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSender>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Validates the request, registers the job and starts its pipeline on a
    /// worker thread. Returns without waiting for any stage.
    pub fn create_job(&self, config: PipelineConfig, streams: StreamOrder) -> CoreResult<JobId> {
        config.validate()?;
        streams.validate(config.mode)?;
        self.reap_finished()?;

        let strategy = PipelineStrategy::for_mode(config.mode);
        let id = JobId::generate();
        self.registry
            .insert(id.clone(), config.mode, strategy.total_steps(&streams))?;
        log::info!(
            "Created job {id} ({} mode, {} + {} input file(s))",
            config.mode,
            streams.camera_a.len(),
            streams.camera_b.len()
        );

        let worker = JobWorker {
            id: id.clone(),
            strategy,
            config,
            streams,
            registry: self.registry.clone(),
            spawner: Arc::clone(&self.spawner),
            probe: Arc::clone(&self.probe),
            notifier: self.notifier.clone(),
        };
        let handle = thread::Builder::new()
            .name(format!("twincam-job-{id}"))
            .spawn(move || worker.run())
            .map_err(|e| {
                let message = format!("Failed to start job thread: {e}");
                if let Err(fail_err) = self.registry.fail(&id, &message) {
                    log::error!("Could not record failure of job {id}: {fail_err}");
                }
                CoreError::OperationFailed(message)
            })?;

        self.lock_handles()?.insert(id.clone(), handle);
        Ok(id)
    }

    pub fn get_status(&self, id: &JobId) -> CoreResult<JobSnapshot> {
        self.reap_finished()?;
        self.registry.get_status(id)
    }

    pub fn get_output_path(&self, id: &JobId) -> CoreResult<PathBuf> {
        self.registry.get_output_path(id)
    }

    pub fn get_details(&self, id: &JobId) -> CoreResult<JobDetails> {
        self.registry.get_details(id)
    }

    pub fn list_jobs(&self) -> CoreResult<Vec<JobDetails>> {
        self.registry.list()
    }

    /// Blocks until the job's worker thread has exited and returns its final
    /// status. Returns immediately for jobs that were already waited on.
    pub fn wait(&self, id: &JobId) -> CoreResult<JobSnapshot> {
        let handle = self.lock_handles()?.remove(id);
        if let Some(handle) = handle {
            self.join_worker(id, handle);
        }
        self.registry.get_status(id)
    }

    /// Joins every worker thread that has already exited. Callers that only
    /// poll and never `wait` would otherwise keep one handle per job forever.
    fn reap_finished(&self) -> CoreResult<()> {
        let finished: Vec<(JobId, JoinHandle<()>)> = {
            let mut handles = self.lock_handles()?;
            let ids: Vec<JobId> = handles
                .iter()
                .filter(|(_, handle)| handle.is_finished())
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| handles.remove(&id).map(|handle| (id, handle)))
                .collect()
        };
        for (id, handle) in finished {
            log::debug!("Reaping worker thread of job {id}");
            self.join_worker(&id, handle);
        }
        Ok(())
    }

    fn join_worker(&self, id: &JobId, handle: JoinHandle<()>) {
        if let Err(payload) = handle.join() {
            let message = format!("Job thread panicked: {}", panic_message(payload.as_ref()));
            log::error!("Job {id}: {message}");
            if let Err(e) = self.registry.fail(id, &message) {
                log::warn!("Could not record failure of job {id}: {e}");
            }
        }
    }

    fn lock_handles(&self) -> CoreResult<std::sync::MutexGuard<'_, HashMap<JobId, JoinHandle<()>>>> {
        self.handles
            .lock()
            .map_err(|_| CoreError::OperationFailed("job handle table poisoned".to_string()))
    }
}

/// Everything a worker thread needs to run one job.
struct JobWorker<S: FfmpegSpawner, P: DurationProbe> {
    id: JobId,
    strategy: PipelineStrategy,
    config: PipelineConfig,
    streams: StreamOrder,
    registry: JobRegistry,
    spawner: Arc<S>,
    probe: Arc<P>,
    notifier: Option<Arc<dyn NotificationSender>>,
}

impl<S: FfmpegSpawner, P: DurationProbe> JobWorker<S, P> {
    fn run(self) {
        let started = Instant::now();
        let reporter = JobReporter::new(self.registry.clone(), self.id.clone());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let work_dir = create_job_dir(&self.config.output_dir, self.id.as_str())
                .map_err(|e| e.in_stage("Prepare work area"))?;
            let runner = StageRunner::new(
                Arc::clone(&self.spawner),
                Arc::clone(&self.probe),
                self.config.clone(),
            );
            self.strategy
                .run(&runner, &self.streams, &work_dir, &reporter)
        }));
        let result = outcome.unwrap_or_else(|payload| {
            Err(CoreError::OperationFailed(format!(
                "Job thread panicked: {}",
                panic_message(payload.as_ref())
            )))
        });

        let notification = match result {
            Ok(output_path) => {
                log::info!(
                    "Job {} done in {:.1}s: {}",
                    self.id,
                    started.elapsed().as_secs_f64(),
                    output_path.display()
                );
                if let Err(e) = self.registry.complete(&self.id, output_path.clone()) {
                    log::error!("Could not record completion of job {}: {e}", self.id);
                }
                Notification::JobComplete {
                    job_id: self.id.to_string(),
                    output_path,
                    elapsed: started.elapsed(),
                }
            }
            Err(e) => {
                let message = e.to_string();
                log::error!("Job {} failed: {message}", self.id);
                if let Err(fail_err) = self.registry.fail(&self.id, &message) {
                    log::error!("Could not record failure of job {}: {fail_err}", self.id);
                }
                Notification::JobError {
                    job_id: self.id.to_string(),
                    message,
                }
            }
        };

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send_notification(&notification) {
                log::warn!("Failed to send notification for job {}: {e}", self.id);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}
