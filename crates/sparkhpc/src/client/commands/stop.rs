use clap::Parser;

use crate::client::globalsettings::GlobalSettings;
use crate::cluster::ClusterContext;
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::job::ClusterJob;
use crate::cluster::registry::ClusterRegistry;

#[derive(Parser)]
pub struct StopOpts {
    /// Job id of the cluster to stop
    #[arg(required_unless_present_any = ["cluster", "all"])]
    pub job_id: Option<String>,

    /// Index of the cluster in the output of `list`
    #[arg(long, conflicts_with_all = ["job_id", "all"])]
    pub cluster: Option<usize>,

    /// Stop all running clusters
    #[arg(long, conflicts_with = "job_id")]
    pub all: bool,
}

/// Stops the selected clusters and returns their job ids.
pub fn stop_clusters(ctx: &ClusterContext, opts: &StopOpts) -> crate::Result<Vec<String>> {
    let job_ids = if opts.all {
        ClusterRegistry::new(ctx)
            .current_clusters()?
            .iter()
            .map(|entry| entry.job_id().to_string())
            .collect()
    } else if let Some(job_id) = &opts.job_id {
        vec![job_id.clone()]
    } else if let Some(index) = opts.cluster {
        vec![ClusterRegistry::new(ctx).resolve_index(index)?]
    } else {
        vec![]
    };

    for job_id in &job_ids {
        ClusterJob::from_job_id(ctx, job_id)?.stop()?;
    }
    Ok(job_ids)
}

pub fn command_stop(gsettings: &GlobalSettings, opts: StopOpts) -> anyhow::Result<()> {
    let ctx = gsettings.create_cluster_context(InterruptFlag::new())?;
    let job_ids = stop_clusters(&ctx, &opts)?;
    gsettings.printer().print_clusters_stopped(&job_ids);
    Ok(())
}
