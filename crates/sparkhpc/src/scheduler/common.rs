use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::Context;
use bstr::ByteSlice;
use regex::Regex;

use crate::scheduler::LiveJob;

/// Resolves scheduler executables, either from `$PATH` or from a configured directory.
#[derive(Clone, Debug, Default)]
pub struct SchedulerCommands {
    bin_dir: Option<PathBuf>,
}

impl SchedulerCommands {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    pub fn program(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn create_command(&self, arguments: &[&str], workdir: Option<&Path>) -> Command {
        let mut command = Command::new(self.program(arguments[0]));
        command.args(&arguments[1..]);
        if let Some(workdir) = workdir {
            command.current_dir(workdir);
        }
        command
    }

    /// Runs a scheduler command and returns its output without checking the exit code.
    pub fn run(
        &self,
        manager: &str,
        arguments: &[&str],
        workdir: Option<&Path>,
    ) -> anyhow::Result<Output> {
        log::debug!("Running {manager} command `{}`", arguments.join(" "));
        self.create_command(arguments, workdir)
            .output()
            .with_context(|| format!("{} start failed", arguments[0]))
    }

    /// Runs a scheduler command with the contents of `input` on its standard input.
    pub fn run_with_stdin(
        &self,
        manager: &str,
        arguments: &[&str],
        input: &Path,
        workdir: Option<&Path>,
    ) -> anyhow::Result<Output> {
        log::debug!(
            "Running {manager} command `{} < {}`",
            arguments.join(" "),
            input.display()
        );
        let stdin = File::open(input)
            .with_context(|| format!("Cannot open {} for reading", input.display()))?;
        self.create_command(arguments, workdir)
            .stdin(Stdio::from(stdin))
            .output()
            .with_context(|| format!("{} start failed", arguments[0]))
    }
}

pub fn check_command_output(output: Output) -> anyhow::Result<Output> {
    let status = output.status;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Exit code: {}\nStderr: {}\nStdout: {}",
            status.code().unwrap_or(-1),
            output.stderr.to_str_lossy().trim(),
            output.stdout.to_str_lossy().trim()
        ));
    }
    Ok(output)
}

/// Returns the standard output of a submit command.
/// A non-zero exit code is a failed submission, reported together with the command output.
pub fn check_submit_output(program: &str, output: Output) -> crate::Result<String> {
    if !output.status.success() {
        let output = format!(
            "Exit code: {}\nStderr: {}\nStdout: {}",
            output.status.code().unwrap_or(-1),
            output.stderr.to_str_lossy().trim(),
            output.stdout.to_str_lossy().trim()
        );
        log::error!("{program} has failed:\n{output}");
        return Err(crate::Error::SubmissionError {
            program: program.to_string(),
            output,
        });
    }
    Ok(stdout_text(&output))
}

pub fn stdout_text(output: &Output) -> String {
    output.stdout.to_str_lossy().into_owned()
}

/// Returns the first capture group of `pattern` in the submit command output.
pub fn extract_job_id(pattern: &Regex, output: &str) -> Option<String> {
    pattern
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Finds the value of the status column in the output of a per-job status query.
/// The first line is a header; the job is described on the second line.
pub fn parse_status_field(output: &str, column: usize) -> Option<&str> {
    output
        .lines()
        .nth(1)
        .and_then(|line| line.split_whitespace().nth(column))
}

/// Parses `<name> <status> <job-id>` rows of a job listing, skipping its header.
/// Rows that do not have exactly three columns are ignored.
pub fn parse_job_listing(output: &str) -> Vec<LiveJob> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [name, status, job_id] => Some(LiveJob {
                    name: name.to_string(),
                    status: status.to_string(),
                    job_id: job_id.to_string(),
                }),
                [] => None,
                _ => {
                    log::debug!("Ignoring malformed job listing line `{line}`");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        SchedulerCommands, check_submit_output, extract_job_id, parse_job_listing,
        parse_status_field,
    };
    use crate::Error;
    use regex::Regex;
    use std::os::unix::process::ExitStatusExt;
    use std::path::{Path, PathBuf};
    use std::process::{ExitStatus, Output};

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_program_resolution() {
        assert_eq!(
            SchedulerCommands::new(None).program("bsub"),
            PathBuf::from("bsub")
        );
        assert_eq!(
            SchedulerCommands::new(Some("/opt/lsf/bin".into())).program("bsub"),
            Path::new("/opt/lsf/bin/bsub")
        );
    }

    #[test]
    fn test_submit_output_success() {
        assert_eq!(
            check_submit_output("sbatch", output(0, "Submitted batch job 7\n", "")).unwrap(),
            "Submitted batch job 7\n"
        );
    }

    #[test]
    fn test_submit_output_failure() {
        let result = check_submit_output(
            "bsub",
            output(255, "", "Bad resource requirement syntax. Job not submitted."),
        );
        match result {
            Err(Error::SubmissionError { program, output }) => {
                assert_eq!(program, "bsub");
                assert!(output.contains("Exit code: 255"));
                assert!(output.contains("Bad resource requirement syntax"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_extract_job_id() {
        let pattern = Regex::new(r"Job <(\d+)>").unwrap();
        assert_eq!(
            extract_job_id(&pattern, "Job <42> is submitted to queue <normal>."),
            Some("42".to_string())
        );
        assert_eq!(extract_job_id(&pattern, "Request aborted"), None);
    }

    #[test]
    fn test_parse_status_field() {
        assert_eq!(parse_status_field("STAT\nRUN\n", 0), Some("RUN"));
        assert_eq!(
            parse_status_field("JOB_NAME STATE JOBID\nspark RUNNING 5\n", 1),
            Some("RUNNING")
        );
        assert_eq!(parse_status_field("STAT\n", 0), None);
        assert_eq!(parse_status_field("", 0), None);
        assert_eq!(parse_status_field("NAME STATE\nspark\n", 1), None);
    }

    #[test]
    fn test_parse_job_listing() {
        let output = "JOB_NAME STAT JOBID\nsparkcluster RUN 12\n\nother PEND 13\nbroken line\n";
        let jobs = parse_job_listing(output);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "sparkcluster");
        assert_eq!(jobs[0].status, "RUN");
        assert_eq!(jobs[0].job_id, "12");
        assert_eq!(jobs[1].job_id, "13");
    }
}
