use std::time::{Duration, Instant};

use clap::Parser;

use crate::client::commands::connect::collect_connection_info;
use crate::client::commands::duration_doc;
use crate::client::commands::submit::ClusterParamsOpts;
use crate::client::globalsettings::GlobalSettings;
use crate::cluster::DEFAULT_ENDPOINT_TIMEOUT;
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::job::{ClusterGuard, ClusterJob};
use crate::common::utils::time::ArgDuration;

const HOLD_POLL_INTERVAL: Duration = Duration::from_millis(200);
const LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Eq, PartialEq)]
enum HoldEnd {
    Interrupted,
    /// The scheduler does not report the job as running anymore (e.g. its walltime has expired)
    JobEnded,
}

#[derive(Parser)]
pub struct StartOpts {
    #[clap(flatten)]
    pub params: ClusterParamsOpts,

    #[arg(
        long,
        default_value = "1h",
        help = duration_doc!("How long to wait for the cluster to start before giving up")
    )]
    pub start_timeout: ArgDuration,
}

/// Blocks until the process is interrupted or the cluster job ends.
fn hold_cluster(
    job: &ClusterJob<'_>,
    interrupt: &InterruptFlag,
    check_interval: Duration,
) -> crate::Result<HoldEnd> {
    let sleep = HOLD_POLL_INTERVAL.min(check_interval);
    let mut last_check = Instant::now();
    while !interrupt.is_raised() {
        if last_check.elapsed() >= check_interval {
            if !job.is_running_now()? {
                return Ok(HoldEnd::JobEnded);
            }
            last_check = Instant::now();
        }
        std::thread::sleep(sleep);
    }
    Ok(HoldEnd::Interrupted)
}

/// Submits a cluster, prints its endpoints and keeps it alive until the process is interrupted.
/// The cluster is stopped on every exit path.
pub fn command_start(gsettings: &GlobalSettings, opts: StartOpts) -> anyhow::Result<()> {
    let start_timeout = opts.start_timeout.unpack();
    let params = opts.params.into_params()?;
    let interrupt = InterruptFlag::register_signals()?;
    let ctx = gsettings.create_cluster_context(interrupt.clone())?;

    let mut cluster = ClusterGuard::new(ClusterJob::new(&ctx, params)?);
    cluster.submit()?;
    gsettings
        .printer()
        .print_cluster_submitted(cluster.descriptor());

    log::info!("Waiting for the cluster to start");
    if !cluster.wait_until_started(start_timeout)? {
        anyhow::bail!(
            "The cluster did not start within {}",
            humantime::format_duration(start_timeout)
        );
    }
    let info = collect_connection_info(&mut cluster, DEFAULT_ENDPOINT_TIMEOUT)?;
    gsettings.printer().print_connection_info(info);

    log::info!("The cluster is running, press Ctrl+C to stop it");
    match hold_cluster(&cluster, &interrupt, LIVENESS_CHECK_INTERVAL)? {
        HoldEnd::Interrupted => log::info!("Stopping the cluster"),
        HoldEnd::JobEnded => log::warn!(
            "Cluster job {} is not running anymore",
            cluster.job_id().unwrap_or_default()
        ),
    }
    cluster.stop()?;
    Ok(())
}
