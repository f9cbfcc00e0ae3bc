use clap::Parser;

use crate::client::commands::duration_doc;
use crate::client::globalsettings::GlobalSettings;
use crate::client::output::outputs::ConnectionInfo;
use crate::cluster::ClusterContext;
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::job::ClusterJob;
use crate::common::utils::size::format_memory_mb;
use crate::common::utils::time::ArgDuration;

/// Selects a single cluster by its job id or by its cluster index.
#[derive(Parser)]
pub struct ClusterSelector {
    /// Job id assigned by the scheduler
    #[arg(required_unless_present = "cluster")]
    pub job_id: Option<String>,

    /// Index of the cluster in the output of `list`
    #[arg(long, conflicts_with = "job_id")]
    pub cluster: Option<usize>,
}

impl ClusterSelector {
    pub fn load<'a>(&self, ctx: &'a ClusterContext) -> crate::Result<ClusterJob<'a>> {
        match (&self.job_id, self.cluster) {
            (Some(job_id), _) => ClusterJob::from_job_id(ctx, job_id),
            (None, Some(index)) => ClusterJob::from_cluster_index(ctx, index),
            (None, None) => Err(crate::Error::GenericError(
                "Either a job id or a cluster index has to be specified".to_string(),
            )),
        }
    }
}

#[derive(Parser)]
pub struct ConnectInfoOpts {
    #[clap(flatten)]
    pub selector: ClusterSelector,

    #[arg(
        long,
        default_value = "60s",
        help = duration_doc!("How long to wait for the cluster to announce its endpoints")
    )]
    pub timeout: ArgDuration,
}

/// Finds the endpoints of a cluster. Endpoints are left empty if the job is not running yet.
pub fn collect_connection_info(
    job: &mut ClusterJob<'_>,
    timeout: std::time::Duration,
) -> crate::Result<ConnectionInfo> {
    let job_id = job
        .descriptor()
        .require_job_id("print connection info")?
        .to_string();
    let (coordinator, web_ui) = if job.is_started()? {
        (
            Some(job.coordinator_endpoint(timeout)?),
            Some(job.web_ui_endpoint(timeout)?),
        )
    } else {
        (None, None)
    };
    let descriptor = job.descriptor();
    Ok(ConnectionInfo {
        job_id,
        job_name: descriptor.job_name.clone(),
        status: descriptor.status(),
        coordinator,
        web_ui,
        driver_memory: format_memory_mb(descriptor.driver_memory),
    })
}

pub fn command_connect_info(gsettings: &GlobalSettings, opts: ConnectInfoOpts) -> anyhow::Result<()> {
    let ctx = gsettings.create_cluster_context(InterruptFlag::register_signals()?)?;
    let mut job = opts.selector.load(&ctx)?;
    let info = collect_connection_info(&mut job, opts.timeout.unpack())?;
    gsettings.printer().print_connection_info(info);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::collect_connection_info;
    use crate::cluster::descriptor::JobStatus;
    use crate::cluster::job::ClusterJob;
    use crate::tests::utils::{create_context, default_params};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_info_of_waiting_job() {
        let dir = TempDir::new().unwrap();
        let (ctx, state) = create_context(dir.path());
        state.set_next_job_id("1");
        let mut job = ClusterJob::new_in(&ctx, default_params(), dir.path().to_path_buf()).unwrap();
        job.submit().unwrap();

        let info = collect_connection_info(&mut job, Duration::from_millis(10)).unwrap();
        assert_eq!(info.job_id, "1");
        assert_eq!(info.status, JobStatus::Submitted);
        assert_eq!(info.coordinator, None);
        assert_eq!(info.web_ui, None);
        assert_eq!(info.driver_memory, "2000M");
    }

    #[test]
    fn test_info_of_running_job() {
        let dir = TempDir::new().unwrap();
        let (ctx, state) = create_context(dir.path());
        state.set_next_job_id("2");
        state.running.set(true);
        state.set_output("[start_cluster] master running at spark://node1:7077\n[start_cluster] master UI available at http://node1:8080\n");
        let mut job = ClusterJob::new_in(&ctx, default_params(), dir.path().to_path_buf()).unwrap();
        job.submit().unwrap();

        let info = collect_connection_info(&mut job, Duration::from_millis(10)).unwrap();
        assert_eq!(info.status, JobStatus::Running);
        assert_eq!(info.coordinator.as_deref(), Some("spark://node1:7077"));
        assert_eq!(info.web_ui.as_deref(), Some("http://node1:8080"));
    }
}
