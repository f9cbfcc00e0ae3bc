pub mod common;
pub mod lsf;
pub mod slurm;

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cluster::descriptor::JobDescriptor;
use crate::common::utils::time::Walltime;
use crate::scheduler::lsf::LsfAdapter;
use crate::scheduler::slurm::SlurmAdapter;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Lsf,
    Slurm,
}

impl Display for SchedulerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerKind::Lsf => f.write_str("LSF"),
            SchedulerKind::Slurm => f.write_str("SLURM"),
        }
    }
}

impl SchedulerKind {
    /// Executable whose presence identifies the scheduler.
    fn probe_program(&self) -> &'static str {
        match self {
            SchedulerKind::Lsf => "bsub",
            SchedulerKind::Slurm => "sbatch",
        }
    }
}

/// Finds out which scheduler is available by looking for its submit command.
/// LSF is preferred when both are found.
pub fn detect_scheduler_kind(bin_dir: Option<&Path>) -> crate::Result<SchedulerKind> {
    log::debug!("Trying to detect the batch scheduler");
    for kind in [SchedulerKind::Lsf, SchedulerKind::Slurm] {
        let program = kind.probe_program();
        let found = match bin_dir {
            Some(dir) => dir.join(program).is_file(),
            None => which::which(program).is_ok(),
        };
        if found {
            log::debug!("{kind} scheduler detected (found `{program}`)");
            return Ok(kind);
        }
    }
    Err(crate::Error::GenericError(
        "Cannot detect a batch scheduler: neither `bsub` (LSF) nor `sbatch` (SLURM) was found"
            .to_string(),
    ))
}

/// A job as reported by the scheduler's job listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiveJob {
    pub name: String,
    pub status: String,
    pub job_id: String,
}

/// Translates cluster lifecycle operations into the commands of one batch scheduler.
pub trait SchedulerAdapter {
    fn kind(&self) -> SchedulerKind;

    /// Submits the job script and returns the job id assigned by the scheduler.
    ///
    /// Fails with `SubmissionError` if the job id cannot be found in the submit output.
    fn submit(&self, script_path: &Path, workdir: &Path) -> crate::Result<String>;

    /// Returns true only if the scheduler reports the job as running.
    /// Missing or malformed status output means that the job is not running (yet).
    fn is_running(&self, job_id: &str) -> bool;

    /// Returns the output produced so far by a running job.
    fn peek(&self, job: &JobDescriptor) -> crate::Result<String>;

    /// Cancels the job. Failures are logged, never returned.
    fn kill(&self, job_id: &str);

    /// Lists jobs that the scheduler currently knows about.
    fn list_current_jobs(&self) -> crate::Result<Vec<LiveJob>>;

    /// Walltime as the job script of this scheduler expects it.
    fn format_walltime(&self, walltime: &Walltime) -> String;

    /// Per-core memory as the job script of this scheduler expects it.
    fn format_memory(&self, memory_mb: u64) -> String;

    /// Job script template used when no override is configured.
    fn default_template(&self) -> &'static str;
}

pub fn create_scheduler_adapter(
    kind: SchedulerKind,
    bin_dir: Option<PathBuf>,
) -> Box<dyn SchedulerAdapter> {
    match kind {
        SchedulerKind::Lsf => Box::new(LsfAdapter::new(bin_dir)),
        SchedulerKind::Slurm => Box::new(SlurmAdapter::new(bin_dir)),
    }
}

#[cfg(test)]
mod tests {
    use super::{SchedulerKind, detect_scheduler_kind};
    use tempfile::TempDir;

    #[test]
    fn test_detect_in_bin_dir() {
        let dir = TempDir::new().unwrap();
        assert!(detect_scheduler_kind(Some(dir.path())).is_err());

        std::fs::write(dir.path().join("sbatch"), "").unwrap();
        assert_eq!(
            detect_scheduler_kind(Some(dir.path())).unwrap(),
            SchedulerKind::Slurm
        );

        std::fs::write(dir.path().join("bsub"), "").unwrap();
        assert_eq!(
            detect_scheduler_kind(Some(dir.path())).unwrap(),
            SchedulerKind::Lsf
        );
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&SchedulerKind::Slurm).unwrap(),
            "\"slurm\""
        );
        assert_eq!(SchedulerKind::Lsf.to_string(), "LSF");
    }
}
