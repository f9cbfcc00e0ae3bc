use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;

use crate::cluster::descriptor::JobDescriptor;
use crate::common::env::{USER, read_env};
use crate::common::utils::size::format_memory_mb;
use crate::common::utils::time::Walltime;
use crate::scheduler::common::{
    SchedulerCommands, check_command_output, check_submit_output, extract_job_id,
    parse_job_listing, parse_status_field, stdout_text,
};
use crate::scheduler::{LiveJob, SchedulerAdapter, SchedulerKind};

const MANAGER: &str = "SLURM";

/// Columns: job name, state, job id
const SQUEUE_FORMAT: &str = "%.j %.T %.i";

static JOB_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"job (\d+)").expect("invalid SLURM job id pattern"));

const DEFAULT_TEMPLATE: &str = include_str!("../../templates/sparkjob.slurm.template");

pub struct SlurmAdapter {
    commands: SchedulerCommands,
}

impl SlurmAdapter {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self {
            commands: SchedulerCommands::new(bin_dir),
        }
    }
}

/// SLURM has no live peek command, the default template redirects the job output
/// into this file inside the job's working directory.
pub fn job_log_path(job: &JobDescriptor, job_id: &str) -> PathBuf {
    job.working_directory
        .join(format!("{}-{}.log", job.job_name, job_id))
}

impl SchedulerAdapter for SlurmAdapter {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Slurm
    }

    fn submit(&self, script_path: &Path, workdir: &Path) -> crate::Result<String> {
        let script = script_path.display().to_string();
        let output = self
            .commands
            .run(MANAGER, &["sbatch", &script], Some(workdir))?;
        let output = check_submit_output("sbatch", output)?;
        log::debug!("Sbatch output: {}", output.trim());
        parse_sbatch_output(&output)
    }

    fn is_running(&self, job_id: &str) -> bool {
        match self
            .commands
            .run(MANAGER, &["squeue", "-o", SQUEUE_FORMAT, "-j", job_id], None)
        {
            Ok(output) => is_running_status(&stdout_text(&output)),
            Err(error) => {
                log::debug!("Cannot query status of SLURM job {job_id}: {error:?}");
                false
            }
        }
    }

    fn peek(&self, job: &JobDescriptor) -> crate::Result<String> {
        let job_id = job.require_job_id("peek at the job output")?;
        let path = job_log_path(job, job_id);
        log::debug!("Reading SLURM job output from {}", path.display());
        Ok(std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read job output {}", path.display()))?)
    }

    fn kill(&self, job_id: &str) {
        let result = self
            .commands
            .run(MANAGER, &["scancel", job_id], None)
            .and_then(check_command_output);
        if let Err(error) = result {
            log::warn!("Could not kill SLURM job {job_id}: {error:?}");
        }
    }

    fn list_current_jobs(&self) -> crate::Result<Vec<LiveJob>> {
        let mut arguments = vec!["squeue", "-o", SQUEUE_FORMAT];
        let user = read_env(USER);
        if let Some(user) = &user {
            arguments.extend_from_slice(&["-u", user.as_str()]);
        }
        let output = self.commands.run(MANAGER, &arguments, None)?;
        let output = check_command_output(output).context("squeue execution failed")?;
        Ok(parse_job_listing(&stdout_text(&output)))
    }

    fn format_walltime(&self, walltime: &Walltime) -> String {
        walltime.total_minutes().to_string()
    }

    fn format_memory(&self, memory_mb: u64) -> String {
        format_memory_mb(memory_mb)
    }

    fn default_template(&self) -> &'static str {
        DEFAULT_TEMPLATE
    }
}

fn parse_sbatch_output(output: &str) -> crate::Result<String> {
    extract_job_id(&JOB_ID_REGEX, output).ok_or_else(|| {
        log::error!("Cannot find job id in sbatch output:\n{output}");
        crate::Error::SubmissionError {
            program: "sbatch".to_string(),
            output: output.trim().to_string(),
        }
    })
}

fn is_running_status(output: &str) -> bool {
    parse_status_field(output, 1) == Some("RUNNING")
}
