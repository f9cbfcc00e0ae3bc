use serde::Serialize;
use serde_json::json;

use crate::client::output::outputs::{ConnectionInfo, Output};
use crate::cluster::descriptor::JobDescriptor;
use crate::cluster::registry::ClusterEntry;

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print(&self, data: impl Serialize) {
        match serde_json::to_string_pretty(&data) {
            Ok(text) => println!("{text}"),
            Err(error) => log::error!("Cannot serialize output: {error:?}"),
        }
    }
}

impl Output for JsonOutput {
    fn print_cluster_submitted(&self, descriptor: &JobDescriptor) {
        self.print(json!({
            "job_id": descriptor.job_id(),
            "cluster": descriptor,
        }));
    }

    fn print_cluster_list(&self, clusters: Vec<ClusterEntry>) {
        self.print(clusters);
    }

    fn print_connection_info(&self, info: ConnectionInfo) {
        self.print(info);
    }

    fn print_clusters_stopped(&self, job_ids: &[String]) {
        self.print(json!({ "stopped": job_ids }));
    }

    fn print_error(&self, error: anyhow::Error) {
        self.print(json!({ "error": format!("{error:?}") }));
    }
}
