use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use crate::client::commands::connect::collect_connection_info;
use crate::client::commands::duration_doc;
use crate::client::globalsettings::GlobalSettings;
use crate::client::output::outputs::ConnectionInfo;
use crate::cluster::DEFAULT_ENDPOINT_TIMEOUT;
use crate::cluster::descriptor::{ClusterParams, ClusterParamsBuilder, DEFAULT_JOB_NAME};
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::job::{ClusterGuard, ClusterJob};
use crate::common::utils::size::ArgMemory;
use crate::common::utils::time::{ArgDuration, ArgWalltime};

/// Resources of a new cluster.
#[derive(Parser)]
pub struct ClusterParamsOpts {
    /// Total number of cores of the cluster
    pub cores: u32,

    /// Walltime of the job in the `HH:MM` format
    #[arg(long, default_value = "00:30")]
    pub walltime: ArgWalltime,

    /// Name of the job
    #[arg(long, default_value = DEFAULT_JOB_NAME)]
    pub jobname: String,

    /// Job script template used instead of the default one
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub template: Option<PathBuf>,

    /// Memory of the Spark driver (e.g. `2000`, `4G`)
    #[arg(long, default_value = "2000M", env = "SPARK_DRIVER_MEMORY")]
    pub driver_memory: ArgMemory,

    /// Memory of each executor [default: memory per core * cores per executor]
    #[arg(long, env = "SPARK_EXECUTOR_MEMORY")]
    pub executor_memory: Option<ArgMemory>,

    /// Memory requested from the scheduler for each core
    #[arg(long, default_value = "2000M")]
    pub memory_per_core: ArgMemory,

    /// Number of cores used by each executor. It has to divide the number of cores.
    #[arg(long, default_value_t = 1)]
    pub cores_per_executor: u32,

    /// Additional directives inserted into the job script
    #[arg(long, default_value = "")]
    pub scheduler_options: String,
}

impl ClusterParamsOpts {
    pub fn into_params(self) -> anyhow::Result<ClusterParams> {
        let mut builder = ClusterParamsBuilder::default()
            .cores(self.cores)
            .cores_per_executor(self.cores_per_executor)
            .memory_per_core(self.memory_per_core.unpack())
            .driver_memory(self.driver_memory.unpack())
            .walltime(self.walltime.unpack())
            .job_name(self.jobname)
            .extra_scheduler_options(self.scheduler_options);
        if let Some(memory) = self.executor_memory {
            builder = builder.memory_per_executor(memory.unpack());
        }
        if let Some(template) = self.template {
            builder = builder.template_path(template);
        }
        let params = builder.build().context("Invalid cluster parameters")?;
        params.validate()?;
        Ok(params)
    }
}

#[derive(Parser)]
pub struct SubmitOpts {
    #[clap(flatten)]
    pub params: ClusterParamsOpts,

    #[arg(long, help = duration_doc!("Wait until the cluster starts, at most for the given duration"))]
    pub wait: Option<ArgDuration>,
}

/// Waits until a submitted cluster starts and collects its endpoints.
///
/// Returns `None` if the cluster did not start within `timeout`, it is left queued in that case.
/// Any error (including an interrupt) stops the cluster, it is released once its endpoints are
/// known.
pub fn wait_for_cluster(
    job: ClusterJob<'_>,
    timeout: Duration,
) -> crate::Result<Option<ConnectionInfo>> {
    let mut cluster = ClusterGuard::new(job);
    if !cluster.wait_until_started(timeout)? {
        cluster.release();
        return Ok(None);
    }
    let info = collect_connection_info(&mut cluster, DEFAULT_ENDPOINT_TIMEOUT)?;
    cluster.release();
    Ok(Some(info))
}

pub fn command_submit(gsettings: &GlobalSettings, opts: SubmitOpts) -> anyhow::Result<()> {
    let params = opts.params.into_params()?;
    let interrupt = match opts.wait {
        Some(_) => InterruptFlag::register_signals()?,
        None => InterruptFlag::new(),
    };
    let ctx = gsettings.create_cluster_context(interrupt)?;

    let mut job = ClusterJob::new(&ctx, params)?;
    job.submit()?;
    gsettings.printer().print_cluster_submitted(job.descriptor());

    if let Some(wait) = opts.wait {
        log::info!("Waiting for the cluster to start");
        if let Some(info) = wait_for_cluster(job, wait.unpack())? {
            gsettings.printer().print_connection_info(info);
        }
    }
    Ok(())
}
