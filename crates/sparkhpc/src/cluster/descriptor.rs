use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::common::utils::time::Walltime;
use crate::scheduler::SchedulerKind;

pub const DEFAULT_JOB_NAME: &str = "sparkcluster";
pub const DEFAULT_MEMORY_MB: u64 = 2000;

/// Lifecycle of a cluster job. The variants are ordered, a status never moves backwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum JobStatus {
    Unsubmitted,
    Submitted,
    Running,
    Stopped,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            JobStatus::Unsubmitted => "UNSUBMITTED",
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::Running => "RUNNING",
            JobStatus::Stopped => "STOPPED",
        };
        f.write_str(status)
    }
}

/// Resources requested for a new cluster.
#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct ClusterParams {
    /// Total number of cores of the allocation
    pub cores: u32,
    #[builder(default = "1")]
    pub cores_per_executor: u32,
    /// Memory per core in MB
    #[builder(default = "DEFAULT_MEMORY_MB")]
    pub memory_per_core: u64,
    /// Memory per executor in MB, derived from the per-core memory if not set
    #[builder(default, setter(strip_option))]
    pub memory_per_executor: Option<u64>,
    /// Memory of the driver (client) in MB
    #[builder(default = "DEFAULT_MEMORY_MB")]
    pub driver_memory: u64,
    #[builder(default)]
    pub walltime: Walltime,
    #[builder(default = "DEFAULT_JOB_NAME.to_string()", setter(into))]
    pub job_name: String,
    #[builder(default, setter(strip_option))]
    pub template_path: Option<PathBuf>,
    #[builder(default, setter(into))]
    pub extra_scheduler_options: String,
}

impl ClusterParams {
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |message: String| Err(crate::Error::InvalidParameters(message));
        if self.cores == 0 {
            return invalid("the number of cores has to be positive".to_string());
        }
        if self.cores_per_executor == 0 {
            return invalid("the number of cores per executor has to be positive".to_string());
        }
        if self.cores % self.cores_per_executor != 0 {
            return invalid(format!(
                "{} cores cannot be split into executors with {} cores each",
                self.cores, self.cores_per_executor
            ));
        }
        if self.memory_per_core == 0 || self.memory_per_executor == Some(0) {
            return invalid("memory has to be positive".to_string());
        }
        if self.executor_memory().is_none() {
            return invalid(format!(
                "memory of an executor ({} MB per core, {} cores) is too large",
                self.memory_per_core, self.cores_per_executor
            ));
        }
        if self.job_name.is_empty() || self.job_name.chars().any(char::is_whitespace) {
            return invalid(format!(
                "job name `{}` must be non-empty and must not contain whitespace",
                self.job_name
            ));
        }
        Ok(())
    }

    /// Memory of one executor in MB, `None` if the derived amount does not fit.
    fn executor_memory(&self) -> Option<u64> {
        self.memory_per_executor
            .or_else(|| self.memory_per_core.checked_mul(self.cores_per_executor as u64))
    }
}

/// Persisted identity of a cluster job.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Assigned by the scheduler on a successful submission, never changed afterwards
    job_id: Option<String>,
    status: JobStatus,
    pub scheduler: SchedulerKind,
    pub job_name: String,
    pub requested_cores: u32,
    pub cores_per_worker: u32,
    pub walltime: Walltime,
    pub memory_per_core: u64,
    pub memory_per_worker: u64,
    pub driver_memory: u64,
    pub template_path: Option<PathBuf>,
    pub working_directory: PathBuf,
    pub extra_scheduler_options: String,
    pub created_at: DateTime<Utc>,
}

impl JobDescriptor {
    pub fn new(
        params: ClusterParams,
        scheduler: SchedulerKind,
        working_directory: PathBuf,
    ) -> crate::Result<Self> {
        params.validate()?;
        let memory_per_worker = params.executor_memory().ok_or_else(|| {
            crate::Error::InvalidParameters("memory of an executor is too large".to_string())
        })?;
        Ok(Self {
            job_id: None,
            status: JobStatus::Unsubmitted,
            scheduler,
            job_name: params.job_name,
            requested_cores: params.cores,
            cores_per_worker: params.cores_per_executor,
            walltime: params.walltime,
            memory_per_core: params.memory_per_core,
            memory_per_worker,
            driver_memory: params.driver_memory,
            template_path: params.template_path,
            working_directory,
            extra_scheduler_options: params.extra_scheduler_options,
            created_at: Utc::now(),
        })
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn worker_count(&self) -> u32 {
        self.requested_cores / self.cores_per_worker
    }

    /// Returns the job id or fails if the job was never submitted.
    pub fn require_job_id(&self, operation: &'static str) -> crate::Result<&str> {
        self.job_id
            .as_deref()
            .ok_or(crate::Error::NotSubmitted { operation })
    }

    pub(crate) fn mark_submitted(&mut self, job_id: String) -> crate::Result<()> {
        if let Some(existing) = &self.job_id {
            return Err(crate::Error::AlreadySubmitted {
                job_id: existing.clone(),
            });
        }
        self.job_id = Some(job_id);
        self.advance(JobStatus::Submitted);
        Ok(())
    }

    /// Moves the status forward. Returns false (and keeps the status) for a regression.
    pub(crate) fn advance(&mut self, status: JobStatus) -> bool {
        if status > self.status {
            self.status = status;
            true
        } else {
            false
        }
    }
}
