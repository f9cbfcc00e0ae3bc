use cli_table::format::{Justify, Separator};
use cli_table::{Cell, CellStruct, Color, ColorChoice, Style, Table, TableStruct, print_stdout};
use colored::Colorize;

use crate::client::output::outputs::{ConnectionInfo, Output};
use crate::cluster::descriptor::{JobDescriptor, JobStatus};
use crate::cluster::registry::ClusterEntry;
use crate::common::utils::str::pluralize;

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn print_vertical_table(&self, rows: Vec<Vec<CellStruct>>) {
        let table = rows.table().separator(
            Separator::builder()
                .column(Some(Default::default()))
                .build(),
        );
        self.print_table(table);
    }

    fn print_horizontal_table(&self, rows: Vec<Vec<CellStruct>>, header: Vec<CellStruct>) {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.print_table(table);
    }

    fn print_table(&self, table: TableStruct) {
        let table = table.color_choice(self.color_policy);
        if let Err(e) = print_stdout(table) {
            log::error!("Cannot print table to stdout: {e:?}");
        }
    }
}

impl Output for CliOutput {
    fn print_cluster_submitted(&self, descriptor: &JobDescriptor) {
        println!(
            "Cluster submitted {}, job ID: {}",
            "successfully".color(colored::Color::Green),
            descriptor.job_id().unwrap_or_default()
        );
    }

    fn print_cluster_list(&self, clusters: Vec<ClusterEntry>) {
        if clusters.is_empty() {
            println!("No clusters are running");
            return;
        }
        let rows: Vec<_> = clusters
            .iter()
            .map(|entry| {
                let descriptor = &entry.descriptor;
                vec![
                    entry.index.cell().justify(Justify::Right),
                    entry.job_id().cell().justify(Justify::Right),
                    descriptor.job_name.as_str().cell(),
                    descriptor.requested_cores.cell(),
                    descriptor.worker_count().cell(),
                    descriptor.walltime.cell(),
                    status_to_cell(descriptor.status()),
                    entry.scheduler_status.as_str().cell(),
                ]
            })
            .collect();
        let header = vec![
            "Index".cell().bold(true),
            "Job ID".cell().bold(true),
            "Name".cell().bold(true),
            "Cores".cell().bold(true),
            "Executors".cell().bold(true),
            "Walltime".cell().bold(true),
            "Status".cell().bold(true),
            "Scheduler status".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_connection_info(&self, info: ConnectionInfo) {
        let not_started = || "not yet started".cell().foreground_color(Some(Color::Cyan));
        let rows = vec![
            vec!["Job ID".cell().bold(true), info.job_id.cell()],
            vec!["Name".cell().bold(true), info.job_name.cell()],
            vec!["Status".cell().bold(true), status_to_cell(info.status)],
            vec![
                "Coordinator".cell().bold(true),
                info.coordinator
                    .map(|endpoint| endpoint.cell())
                    .unwrap_or_else(not_started),
            ],
            vec![
                "Web UI".cell().bold(true),
                info.web_ui
                    .map(|endpoint| endpoint.cell())
                    .unwrap_or_else(not_started),
            ],
            vec!["Driver memory".cell().bold(true), info.driver_memory.cell()],
        ];
        self.print_vertical_table(rows);
    }

    fn print_clusters_stopped(&self, job_ids: &[String]) {
        if job_ids.is_empty() {
            println!("No clusters were stopped");
            return;
        }
        println!(
            "Stopped {} {}: {}",
            job_ids.len(),
            pluralize("cluster", job_ids.len()),
            job_ids.join(", ")
        );
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}

fn status_to_cell(status: JobStatus) -> CellStruct {
    let color = match status {
        JobStatus::Unsubmitted => Color::White,
        JobStatus::Submitted => Color::Cyan,
        JobStatus::Running => Color::Green,
        JobStatus::Stopped => Color::Magenta,
    };
    status.to_string().cell().foreground_color(Some(color))
}
