use crate::client::globalsettings::GlobalSettings;
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::registry::ClusterRegistry;

pub fn command_list(gsettings: &GlobalSettings) -> anyhow::Result<()> {
    let ctx = gsettings.create_cluster_context(InterruptFlag::new())?;
    let clusters = ClusterRegistry::new(&ctx).current_clusters()?;
    gsettings.printer().print_cluster_list(clusters);
    Ok(())
}
