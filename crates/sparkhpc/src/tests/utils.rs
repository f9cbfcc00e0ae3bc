use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::cluster::descriptor::{ClusterParamsBuilder, JobDescriptor};
use crate::cluster::store::DescriptorStore;
use crate::cluster::{ClusterContext, PollIntervals};
use crate::common::utils::size::format_memory_mb;
use crate::common::utils::time::Walltime;
use crate::scheduler::{LiveJob, SchedulerAdapter, SchedulerKind};

pub fn create_descriptor(workdir: &Path) -> JobDescriptor {
    let params = ClusterParamsBuilder::default().cores(4).build().unwrap();
    JobDescriptor::new(params, SchedulerKind::Lsf, workdir.to_path_buf()).unwrap()
}

/// Scripted scheduler behavior, shared between a test and the [`MockScheduler`] it created.
#[derive(Default)]
pub struct MockState {
    /// Job id returned by the next submission, `None` makes the submission fail
    pub next_job_id: RefCell<Option<String>>,
    pub running: Cell<bool>,
    /// Job output, `None` makes peeking fail
    pub output: RefCell<Option<String>>,
    pub live_jobs: RefCell<Vec<LiveJob>>,
    pub submitted_scripts: RefCell<Vec<PathBuf>>,
    pub killed: RefCell<Vec<String>>,
    pub status_queries: Cell<usize>,
}

impl MockState {
    pub fn set_next_job_id(&self, job_id: &str) {
        *self.next_job_id.borrow_mut() = Some(job_id.to_string());
    }

    pub fn set_output(&self, output: &str) {
        *self.output.borrow_mut() = Some(output.to_string());
    }

    pub fn set_live_jobs(&self, job_ids: &[&str]) {
        *self.live_jobs.borrow_mut() = job_ids
            .iter()
            .map(|job_id| LiveJob {
                name: "sparkcluster".to_string(),
                status: "RUN".to_string(),
                job_id: job_id.to_string(),
            })
            .collect();
    }
}

pub struct MockScheduler {
    state: Rc<MockState>,
}

impl MockScheduler {
    pub fn new() -> (Self, Rc<MockState>) {
        let state = Rc::new(MockState::default());
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl SchedulerAdapter for MockScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Lsf
    }

    fn submit(&self, script_path: &Path, _workdir: &Path) -> crate::Result<String> {
        self.state
            .submitted_scripts
            .borrow_mut()
            .push(script_path.to_path_buf());
        self.state
            .next_job_id
            .borrow_mut()
            .take()
            .ok_or_else(|| crate::Error::SubmissionError {
                program: "bsub".to_string(),
                output: "Request aborted by esub".to_string(),
            })
    }

    fn is_running(&self, _job_id: &str) -> bool {
        self.state.status_queries.set(self.state.status_queries.get() + 1);
        self.state.running.get()
    }

    fn peek(&self, job: &JobDescriptor) -> crate::Result<String> {
        self.state.output.borrow().clone().ok_or_else(|| {
            crate::Error::GenericError(format!("no output for job {:?}", job.job_id()))
        })
    }

    fn kill(&self, job_id: &str) {
        self.state.killed.borrow_mut().push(job_id.to_string());
    }

    fn list_current_jobs(&self) -> crate::Result<Vec<LiveJob>> {
        Ok(self.state.live_jobs.borrow().clone())
    }

    fn format_walltime(&self, walltime: &Walltime) -> String {
        walltime.to_string()
    }

    fn format_memory(&self, memory_mb: u64) -> String {
        format_memory_mb(memory_mb)
    }

    fn default_template(&self) -> &'static str {
        "#MOCK -n {ncores} -W {walltime}\n{launcher} start-cluster --executors {number_of_executors}\n"
    }
}

/// Context with a mock scheduler, a store inside `dir` and short poll intervals.
pub fn create_context(dir: &Path) -> (ClusterContext, Rc<MockState>) {
    let (scheduler, state) = MockScheduler::new();
    let store = DescriptorStore::open(&dir.join("store")).unwrap();
    let ctx = ClusterContext::new(Box::new(scheduler), store)
        .with_spark_home(Some(PathBuf::from("/opt/spark")))
        .with_launcher(PathBuf::from("/usr/bin/sparkcluster"))
        .with_poll_intervals(PollIntervals {
            start: Duration::from_millis(5),
            endpoint: Duration::from_millis(5),
        });
    (ctx, state)
}

pub fn default_params() -> crate::cluster::descriptor::ClusterParams {
    ClusterParamsBuilder::default()
        .cores(4)
        .cores_per_executor(2)
        .build()
        .unwrap()
}
