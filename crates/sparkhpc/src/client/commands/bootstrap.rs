use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use anyhow::Context;
use bstr::ByteSlice;
use clap::Parser;

use crate::client::commands::duration_doc;
use crate::client::globalsettings::GlobalSettings;
use crate::cluster::endpoint::EndpointKind;
use crate::cluster::interrupt::InterruptFlag;
use crate::common::env::{SPARK_HOME, read_env};
use crate::common::utils::size::{ArgMemory, format_memory_mb};
use crate::common::utils::time::ArgDuration;
use crate::scheduler::SchedulerKind;
use crate::scheduler::common::check_command_output;

const MASTER_POLL_INTERVAL: Duration = Duration::from_millis(500);
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(200);
const WORKER_CLASS: &str = "org.apache.spark.deploy.worker.Worker";

/// Prefix of the lines that announce the endpoints in the job output
const ANNOUNCE_PREFIX: &str = "[start_cluster]";

#[derive(Parser)]
pub struct StartClusterOpts {
    /// Number of executors to start
    #[arg(long)]
    pub executors: u32,

    /// Cores used by each executor
    #[arg(long, default_value_t = 1)]
    pub cores_per_executor: u32,

    /// Memory of each executor
    #[arg(long, default_value = "2000M")]
    pub memory_per_executor: ArgMemory,

    #[arg(
        long,
        default_value = "60s",
        help = duration_doc!("How long to wait for the master to report its address")
    )]
    pub master_timeout: ArgDuration,
}

/// `start-master.sh` reports the log file of the daemon it has started.
fn parse_master_log_path(output: &str) -> Option<PathBuf> {
    output.lines().find_map(|line| {
        line.split_once("logging to ")
            .map(|(_, path)| PathBuf::from(path.trim()))
    })
}

fn find_master_endpoints(log: &str) -> Option<(String, String)> {
    let coordinator = EndpointKind::Coordinator.find(log)?;
    let web_ui = EndpointKind::WebUi.find(log)?;
    Some((coordinator.to_string(), web_ui.to_string()))
}

/// Command that runs one foreground worker per executor across the allocation.
fn worker_command(
    kind: SchedulerKind,
    spark_home: &Path,
    opts: &StartClusterOpts,
    master_url: &str,
) -> Vec<String> {
    let executors = opts.executors.to_string();
    let cores = opts.cores_per_executor.to_string();
    let mut args: Vec<String> = match kind {
        SchedulerKind::Lsf => vec!["mpirun".into(), "-np".into(), executors],
        SchedulerKind::Slurm => vec![
            "srun".into(),
            "--ntasks".into(),
            executors,
            "--cpus-per-task".into(),
            cores.clone(),
        ],
    };
    args.extend([
        spark_home.join("bin").join("spark-class").display().to_string(),
        WORKER_CLASS.to_string(),
        "--cores".to_string(),
        cores,
        "--memory".to_string(),
        format_memory_mb(*opts.memory_per_executor.get()),
        master_url.to_string(),
    ]);
    args
}

fn stop_master(sbin: &Path) {
    let script = sbin.join("stop-master.sh");
    log::debug!("Running {}", script.display());
    match Command::new(&script).output() {
        Ok(output) if output.status.success() => {}
        Ok(output) => log::warn!(
            "Stopping the master failed with {}: {}",
            output.status,
            output.stderr.to_str_lossy().trim()
        ),
        Err(error) => log::warn!("Cannot run {}: {error}", script.display()),
    }
}

fn start_master(sbin: &Path) -> anyhow::Result<PathBuf> {
    let script = sbin.join("start-master.sh");
    log::info!("Starting the master with {}", script.display());
    let output = Command::new(&script)
        .output()
        .with_context(|| format!("Cannot start {}", script.display()))?;
    let output = check_command_output(output)?;
    let stdout = output.stdout.to_str_lossy();
    parse_master_log_path(&stdout).ok_or_else(|| {
        anyhow::anyhow!("Cannot find the master log file in the output of the master:\n{stdout}")
    })
}

fn wait_for_master(
    log_path: &Path,
    timeout: Duration,
    interrupt: &InterruptFlag,
) -> anyhow::Result<Option<(String, String)>> {
    let start = Instant::now();
    loop {
        match std::fs::read_to_string(log_path) {
            Ok(log) => {
                if let Some(endpoints) = find_master_endpoints(&log) {
                    return Ok(Some(endpoints));
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Cannot read master log {}", log_path.display()));
            }
        }
        if interrupt.is_raised() {
            anyhow::bail!("Interrupted while waiting for the master");
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(MASTER_POLL_INTERVAL);
    }
}

fn wait_for_workers(mut child: Child, interrupt: &InterruptFlag) -> anyhow::Result<()> {
    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                log::info!("All workers have finished");
                return Ok(());
            }
            anyhow::bail!("Workers have ended with {status}");
        }
        if interrupt.is_raised() {
            log::info!("Interrupted, stopping the workers");
            child.kill()?;
            child.wait()?;
            return Ok(());
        }
        std::thread::sleep(WORKER_POLL_INTERVAL);
    }
}

/// Runs inside the job allocation: starts the master, announces its endpoints in the job
/// output and runs the workers until they exit.
pub fn command_start_cluster(
    gsettings: &GlobalSettings,
    opts: StartClusterOpts,
) -> anyhow::Result<()> {
    let config = gsettings.load_config()?;
    let kind = gsettings.scheduler_kind(&config)?;
    let spark_home = read_env(SPARK_HOME)
        .map(PathBuf::from)
        .ok_or(crate::Error::MissingEnvironment {
            name: SPARK_HOME,
            operation: "start the cluster",
        })?;
    let sbin = spark_home.join("sbin");
    let interrupt = InterruptFlag::register_signals()?;

    let log_path = start_master(&sbin)?;
    let timeout = *opts.master_timeout.get();
    let (coordinator, web_ui) = match wait_for_master(&log_path, timeout, &interrupt) {
        Ok(Some(endpoints)) => endpoints,
        Ok(None) => {
            stop_master(&sbin);
            anyhow::bail!(
                "The master did not report its address within {}, check the log at {}",
                humantime::format_duration(timeout),
                log_path.display()
            );
        }
        Err(error) => {
            stop_master(&sbin);
            return Err(error);
        }
    };

    println!("{ANNOUNCE_PREFIX} master running at {coordinator}");
    println!("{ANNOUNCE_PREFIX} master UI available at {web_ui}");
    std::io::stdout().flush()?;

    let args = worker_command(kind, &spark_home, &opts, &coordinator);
    log::info!("Starting workers: {}", args.join(" "));
    let result = Command::new(&args[0])
        .args(&args[1..])
        .spawn()
        .with_context(|| format!("Cannot start workers with `{}`", args[0]))
        .and_then(|child| wait_for_workers(child, &interrupt));
    stop_master(&sbin);
    result
}

#[cfg(test)]
mod tests {
    use super::{StartClusterOpts, find_master_endpoints, parse_master_log_path, worker_command};
    use crate::scheduler::SchedulerKind;
    use clap::Parser;
    use std::path::{Path, PathBuf};

    fn opts() -> StartClusterOpts {
        StartClusterOpts::try_parse_from([
            "start-cluster",
            "--executors",
            "4",
            "--cores-per-executor",
            "2",
            "--memory-per-executor",
            "4G",
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_master_log_path() {
        let output = "starting org.apache.spark.deploy.master.Master, logging to /home/user/spark/logs/spark-master-node1.out\n";
        assert_eq!(
            parse_master_log_path(output),
            Some(PathBuf::from("/home/user/spark/logs/spark-master-node1.out"))
        );
        assert_eq!(parse_master_log_path("master is already running"), None);
    }

    #[test]
    fn test_find_master_endpoints() {
        let log = "INFO Master: Starting Spark master at spark://node1:7077
INFO Utils: Successfully started service 'MasterUI' on port 8080.
INFO MasterWebUI: Bound MasterWebUI to 0.0.0.0, and started at http://node1:8080";
        assert_eq!(
            find_master_endpoints(log),
            Some((
                "spark://node1:7077".to_string(),
                "http://node1:8080".to_string()
            ))
        );
        assert_eq!(
            find_master_endpoints("INFO Master: Starting Spark master at spark://node1:7077"),
            None
        );
    }

    #[test]
    fn test_lsf_worker_command() {
        let args = worker_command(
            SchedulerKind::Lsf,
            Path::new("/opt/spark"),
            &opts(),
            "spark://node1:7077",
        );
        assert_eq!(
            args.join(" "),
            "mpirun -np 4 /opt/spark/bin/spark-class org.apache.spark.deploy.worker.Worker --cores 2 --memory 4096M spark://node1:7077"
        );
    }

    #[test]
    fn test_slurm_worker_command() {
        let args = worker_command(
            SchedulerKind::Slurm,
            Path::new("/opt/spark"),
            &opts(),
            "spark://node1:7077",
        );
        assert_eq!(
            args.join(" "),
            "srun --ntasks 4 --cpus-per-task 2 /opt/spark/bin/spark-class org.apache.spark.deploy.worker.Worker --cores 2 --memory 4096M spark://node1:7077"
        );
    }
}
