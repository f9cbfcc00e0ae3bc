use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use bstr::ByteSlice;
use regex::Regex;

use crate::cluster::descriptor::JobDescriptor;
use crate::common::utils::time::Walltime;
use crate::scheduler::common::{
    SchedulerCommands, check_command_output, check_submit_output, extract_job_id,
    parse_job_listing, parse_status_field, stdout_text,
};
use crate::scheduler::{LiveJob, SchedulerAdapter, SchedulerKind};

const MANAGER: &str = "LSF";

static JOB_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Job <(\d+)>").expect("invalid LSF job id pattern"));

const DEFAULT_TEMPLATE: &str = include_str!("../../templates/sparkjob.lsf.template");

pub struct LsfAdapter {
    commands: SchedulerCommands,
}

impl LsfAdapter {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self {
            commands: SchedulerCommands::new(bin_dir),
        }
    }
}

impl SchedulerAdapter for LsfAdapter {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Lsf
    }

    fn submit(&self, script_path: &Path, workdir: &Path) -> crate::Result<String> {
        let output = self
            .commands
            .run_with_stdin(MANAGER, &["bsub"], script_path, Some(workdir))?;
        let output = check_submit_output("bsub", output)?;
        log::debug!("bsub output: {}", output.trim());
        parse_bsub_output(&output)
    }

    fn is_running(&self, job_id: &str) -> bool {
        match self
            .commands
            .run(MANAGER, &["bjobs", "-o", "stat", job_id], None)
        {
            Ok(output) => is_running_status(&stdout_text(&output)),
            Err(error) => {
                log::debug!("Cannot query status of LSF job {job_id}: {error:?}");
                false
            }
        }
    }

    fn peek(&self, job: &JobDescriptor) -> crate::Result<String> {
        let job_id = job.require_job_id("peek at the job output")?;
        let output = self.commands.run(MANAGER, &["bpeek", job_id], None)?;
        let output = check_command_output(output).context("bpeek execution failed")?;
        Ok(stdout_text(&output))
    }

    fn kill(&self, job_id: &str) {
        let result = self
            .commands
            .run(MANAGER, &["bkill", job_id], None)
            .and_then(check_command_output);
        if let Err(error) = result {
            log::warn!("Could not kill LSF job {job_id}: {error:?}");
        }
    }

    fn list_current_jobs(&self) -> crate::Result<Vec<LiveJob>> {
        let output = self
            .commands
            .run(MANAGER, &["bjobs", "-o", "job_name stat jobid"], None)?;
        if !output.status.success() && is_empty_listing(&output.stderr.to_str_lossy()) {
            return Ok(vec![]);
        }
        let output = check_command_output(output).context("bjobs execution failed")?;
        Ok(parse_job_listing(&stdout_text(&output)))
    }

    fn format_walltime(&self, walltime: &Walltime) -> String {
        walltime.to_string()
    }

    fn format_memory(&self, memory_mb: u64) -> String {
        memory_mb.to_string()
    }

    fn default_template(&self) -> &'static str {
        DEFAULT_TEMPLATE
    }
}

fn parse_bsub_output(output: &str) -> crate::Result<String> {
    extract_job_id(&JOB_ID_REGEX, output).ok_or_else(|| {
        log::error!("Cannot find job id in bsub output:\n{output}");
        crate::Error::SubmissionError {
            program: "bsub".to_string(),
            output: output.trim().to_string(),
        }
    })
}

fn is_running_status(output: &str) -> bool {
    parse_status_field(output, 0) == Some("RUN")
}

/// `bjobs` reports an empty queue on stderr with a non-zero exit code.
fn is_empty_listing(stderr: &str) -> bool {
    stderr.contains("No unfinished job found") || stderr.contains("No job found")
}
