use serde::Serialize;

use crate::cluster::descriptor::{JobDescriptor, JobStatus};
use crate::cluster::registry::ClusterEntry;

#[derive(clap::ValueEnum, Clone)]
pub enum Outputs {
    CLI,
    JSON,
}

/// What a client needs to connect to a cluster.
#[derive(Serialize, Debug)]
pub struct ConnectionInfo {
    pub job_id: String,
    pub job_name: String,
    pub status: JobStatus,
    /// `None` if the job was not started yet
    pub coordinator: Option<String>,
    pub web_ui: Option<String>,
    /// Memory of the driver as a JVM memory string
    pub driver_memory: String,
}

pub trait Output {
    fn print_cluster_submitted(&self, descriptor: &JobDescriptor);
    fn print_cluster_list(&self, clusters: Vec<ClusterEntry>);
    fn print_connection_info(&self, info: ConnectionInfo);
    fn print_clusters_stopped(&self, job_ids: &[String]);

    fn print_error(&self, error: anyhow::Error);
}
