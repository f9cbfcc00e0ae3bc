pub mod descriptor;
pub mod endpoint;
pub mod interrupt;
pub mod job;
pub mod registry;
pub mod store;
pub mod template;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Map;
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::store::DescriptorStore;
use crate::scheduler::{SchedulerAdapter, SchedulerKind};

/// Name of the job script written into the working directory of a cluster.
pub const SUBMIT_SCRIPT_NAME: &str = "sparkjob.sh";

pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct PollIntervals {
    /// Delay between scheduler status queries while waiting for a job to start
    pub start: Duration,
    /// Delay between reads of the job output while looking for an endpoint
    pub endpoint: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            start: Duration::from_secs(1),
            endpoint: Duration::from_millis(500),
        }
    }
}

/// Everything a cluster job needs from its surroundings.
/// It is resolved once when the process starts and then passed to all cluster operations.
pub struct ClusterContext {
    adapter: Box<dyn SchedulerAdapter>,
    store: DescriptorStore,
    spark_home: Option<PathBuf>,
    launcher: PathBuf,
    template_overrides: Map<SchedulerKind, PathBuf>,
    poll_intervals: PollIntervals,
    interrupt: InterruptFlag,
}

impl ClusterContext {
    pub fn new(adapter: Box<dyn SchedulerAdapter>, store: DescriptorStore) -> Self {
        let launcher = std::env::current_exe().unwrap_or_else(|error| {
            log::debug!("Cannot get the path of the current executable: {error}");
            PathBuf::from("sparkcluster")
        });
        Self {
            adapter,
            store,
            spark_home: None,
            launcher,
            template_overrides: Default::default(),
            poll_intervals: Default::default(),
            interrupt: Default::default(),
        }
    }

    pub fn with_spark_home(mut self, spark_home: Option<PathBuf>) -> Self {
        self.spark_home = spark_home;
        self
    }

    pub fn with_launcher(mut self, launcher: PathBuf) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_template_override(mut self, kind: SchedulerKind, template: PathBuf) -> Self {
        self.template_overrides.insert(kind, template);
        self
    }

    pub fn with_poll_intervals(mut self, poll_intervals: PollIntervals) -> Self {
        self.poll_intervals = poll_intervals;
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn adapter(&self) -> &dyn SchedulerAdapter {
        self.adapter.as_ref()
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    pub fn spark_home(&self) -> Option<&Path> {
        self.spark_home.as_deref()
    }

    pub fn launcher(&self) -> &Path {
        &self.launcher
    }

    pub fn template_override(&self, kind: SchedulerKind) -> Option<&Path> {
        self.template_overrides.get(&kind).map(|p| p.as_path())
    }

    pub fn poll_intervals(&self) -> &PollIntervals {
        &self.poll_intervals
    }

    pub fn interrupt(&self) -> &InterruptFlag {
        &self.interrupt
    }
}
