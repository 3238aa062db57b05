//! Job records and the shared registry holding them.
//!
//! A record starts as `processing` and moves exactly once to `done` or
//! `error`. Progress only ever grows. Terminal records are never modified.

use super::JobId;
use crate::config::PipelineMode;
use crate::error::{CoreError, CoreResult};
use crate::pipeline::JobSink;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
    Error,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// What a status poll returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Full record of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub error_message: Option<String>,
    /// Set only once the job is done.
    pub output_path: Option<PathBuf>,
    pub mode: PipelineMode,
    /// Label of the stage currently (or last) running.
    pub stage: Option<String>,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobDetails {
    fn new(id: JobId, mode: PipelineMode, total_steps: usize) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            progress: 0,
            error_message: None,
            output_path: None,
            mode,
            stage: None,
            completed_steps: 0,
            total_steps,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            progress: self.progress,
            error_message: self.error_message.clone(),
        }
    }
}

/// Shared, cloneable handle on the job table.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobDetails>>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, HashMap<JobId, JobDetails>>> {
        self.jobs
            .read()
            .map_err(|_| CoreError::OperationFailed("job registry lock poisoned".to_string()))
    }

    fn write(&self) -> CoreResult<RwLockWriteGuard<'_, HashMap<JobId, JobDetails>>> {
        self.jobs
            .write()
            .map_err(|_| CoreError::OperationFailed("job registry lock poisoned".to_string()))
    }

    /// Runs `f` on a job that is still processing.
    fn update<F>(&self, id: &JobId, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut JobDetails),
    {
        let mut jobs = self.write()?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| CoreError::JobNotFound(id.to_string()))?;
        if job.status.is_terminal() {
            return Err(CoreError::OperationFailed(format!(
                "job {id} already finished with status {:?}",
                job.status
            )));
        }
        f(job);
        Ok(())
    }

    pub(crate) fn insert(&self, id: JobId, mode: PipelineMode, total_steps: usize) -> CoreResult<()> {
        let mut jobs = self.write()?;
        if jobs.contains_key(&id) {
            return Err(CoreError::OperationFailed(format!("job {id} already exists")));
        }
        jobs.insert(id.clone(), JobDetails::new(id, mode, total_steps));
        Ok(())
    }

    pub fn get_status(&self, id: &JobId) -> CoreResult<JobSnapshot> {
        self.read()?
            .get(id)
            .map(JobDetails::snapshot)
            .ok_or_else(|| CoreError::JobNotFound(id.to_string()))
    }

    /// The output file of a finished job.
    pub fn get_output_path(&self, id: &JobId) -> CoreResult<PathBuf> {
        let jobs = self.read()?;
        let job = jobs
            .get(id)
            .ok_or_else(|| CoreError::JobNotFound(id.to_string()))?;
        match (&job.status, &job.output_path) {
            (JobStatus::Done, Some(path)) => Ok(path.clone()),
            (status, _) => Err(CoreError::JobNotReady(format!(
                "job {id} is {}",
                format!("{status:?}").to_lowercase()
            ))),
        }
    }

    pub fn get_details(&self, id: &JobId) -> CoreResult<JobDetails> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::JobNotFound(id.to_string()))
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> CoreResult<Vec<JobDetails>> {
        let mut jobs: Vec<JobDetails> = self.read()?.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    /// Raises the job's progress to `percent`. Lower values are ignored.
    pub fn record_progress(&self, id: &JobId, percent: u8) -> CoreResult<()> {
        self.update(id, |job| {
            job.progress = job.progress.max(percent.min(100));
        })
    }

    pub fn record_stage(
        &self,
        id: &JobId,
        label: &str,
        completed_steps: usize,
        total_steps: usize,
    ) -> CoreResult<()> {
        self.update(id, |job| {
            job.stage = Some(label.to_string());
            job.completed_steps = job.completed_steps.max(completed_steps);
            job.total_steps = total_steps;
        })
    }

    /// Marks the job done with its output file.
    pub fn complete(&self, id: &JobId, output_path: PathBuf) -> CoreResult<()> {
        self.update(id, |job| {
            job.status = JobStatus::Done;
            job.progress = 100;
            job.completed_steps = job.total_steps;
            job.output_path = Some(output_path);
            job.finished_at = Some(Utc::now());
        })
    }

    /// Marks the job failed. Progress stays where it was.
    pub fn fail(&self, id: &JobId, message: &str) -> CoreResult<()> {
        self.update(id, |job| {
            job.status = JobStatus::Error;
            job.error_message = Some(message.to_string());
            job.finished_at = Some(Utc::now());
        })
    }
}

/// A running pipeline's view of its own job record.
pub struct JobReporter {
    registry: JobRegistry,
    id: JobId,
}

impl JobReporter {
    pub fn new(registry: JobRegistry, id: JobId) -> Self {
        Self { registry, id }
    }
}

impl JobSink for JobReporter {
    fn record_progress(&self, percent: u8) {
        match self.registry.record_progress(&self.id, percent) {
            Ok(()) => log::trace!("Job {} progress {percent}%", self.id),
            Err(e) => log::warn!("Dropped progress update for job {}: {e}", self.id),
        }
    }

    fn record_stage(&self, label: &str, completed_steps: usize, total_steps: usize) {
        if let Err(e) = self
            .registry
            .record_stage(&self.id, label, completed_steps, total_steps)
        {
            log::warn!("Dropped stage update for job {}: {e}", self.id);
        }
    }
}
