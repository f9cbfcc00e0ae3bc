use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::cluster::descriptor::{ClusterParams, JobDescriptor, JobStatus};
use crate::cluster::endpoint::EndpointKind;
use crate::cluster::registry::ClusterRegistry;
use crate::cluster::template::{TemplateValues, build_template_variables, render_template};
use crate::cluster::{ClusterContext, SUBMIT_SCRIPT_NAME};
use crate::common::env::SPARK_HOME;
use crate::common::utils::fs::{get_current_dir, write_atomically};

/// One cluster job bound to the scheduler and store of a [`ClusterContext`].
pub struct ClusterJob<'a> {
    ctx: &'a ClusterContext,
    descriptor: JobDescriptor,
}

impl<'a> ClusterJob<'a> {
    /// Creates a new, unsubmitted cluster in the current working directory.
    pub fn new(ctx: &'a ClusterContext, params: ClusterParams) -> crate::Result<Self> {
        Self::new_in(ctx, params, get_current_dir()?)
    }

    pub fn new_in(
        ctx: &'a ClusterContext,
        params: ClusterParams,
        working_directory: PathBuf,
    ) -> crate::Result<Self> {
        let descriptor = JobDescriptor::new(params, ctx.adapter().kind(), working_directory)?;
        Ok(Self { ctx, descriptor })
    }

    /// Reattaches to a previously submitted cluster.
    pub fn from_job_id(ctx: &'a ClusterContext, job_id: &str) -> crate::Result<Self> {
        let descriptor = ctx.store().load(job_id)?;
        if descriptor.scheduler != ctx.adapter().kind() {
            log::warn!(
                "Job {job_id} was submitted to {}, but the {} scheduler is in use",
                descriptor.scheduler,
                ctx.adapter().kind()
            );
        }
        Ok(Self { ctx, descriptor })
    }

    /// Reattaches to the cluster at `index` of the currently running clusters.
    pub fn from_cluster_index(ctx: &'a ClusterContext, index: usize) -> crate::Result<Self> {
        let job_id = ClusterRegistry::new(ctx).resolve_index(index)?;
        Self::from_job_id(ctx, &job_id)
    }

    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }

    pub fn job_id(&self) -> Option<&str> {
        self.descriptor.job_id()
    }

    pub fn status(&self) -> JobStatus {
        self.descriptor.status()
    }

    fn load_template(&self) -> crate::Result<String> {
        let path = self
            .descriptor
            .template_path
            .as_deref()
            .or_else(|| self.ctx.template_override(self.descriptor.scheduler));
        match path {
            Some(path) => {
                log::debug!("Using job script template {}", path.display());
                std::fs::read_to_string(path).map_err(|error| {
                    crate::Error::TemplateError(format!(
                        "cannot read template {}: {error}",
                        path.display()
                    ))
                })
            }
            None => Ok(self.ctx.adapter().default_template().to_string()),
        }
    }

    /// Writes the job script into the working directory and submits it.
    /// Returns the job id assigned by the scheduler.
    pub fn submit(&mut self) -> crate::Result<String> {
        if let Some(job_id) = self.descriptor.job_id() {
            return Err(crate::Error::AlreadySubmitted {
                job_id: job_id.to_string(),
            });
        }
        let spark_home = self
            .ctx
            .spark_home()
            .ok_or(crate::Error::MissingEnvironment {
                name: SPARK_HOME,
                operation: "submit a cluster",
            })?;

        let template = self.load_template()?;
        let values = TemplateValues {
            spark_home,
            launcher: self.ctx.launcher(),
        };
        let variables = build_template_variables(&self.descriptor, self.ctx.adapter(), &values);
        let script = render_template(&template, &variables)?;

        let workdir = &self.descriptor.working_directory;
        let script_path = workdir.join(SUBMIT_SCRIPT_NAME);
        write_atomically(&script_path, script.as_bytes())?;
        log::debug!("Job script written into {}", script_path.display());

        let job_id = self.ctx.adapter().submit(&script_path, workdir)?;
        self.descriptor.mark_submitted(job_id.clone())?;
        self.ctx.store().save(&self.descriptor)?;
        log::info!(
            "Cluster submitted to {} as job {job_id} ({} cores, {} executors)",
            self.descriptor.scheduler,
            self.descriptor.requested_cores,
            self.descriptor.worker_count()
        );
        Ok(job_id)
    }

    /// Asks the scheduler whether the job runs.
    ///
    /// The first positive answer moves the job to `Running` and persists it. A `Running` job
    /// stays `Running` even if the scheduler stops reporting it, only [`ClusterJob::stop`]
    /// moves it further.
    pub fn is_started(&mut self) -> crate::Result<bool> {
        let job_id = self
            .descriptor
            .require_job_id("check whether the cluster is running")?
            .to_string();
        match self.descriptor.status() {
            JobStatus::Stopped => Ok(false),
            status => {
                if self.ctx.adapter().is_running(&job_id) {
                    if self.descriptor.advance(JobStatus::Running) {
                        log::debug!("Job {job_id} is running");
                        self.ctx.store().save(&self.descriptor)?;
                    }
                    Ok(true)
                } else if status == JobStatus::Running {
                    log::debug!("Job {job_id} is not reported as running anymore");
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Asks the scheduler whether the job runs right now, without touching the recorded status.
    pub fn is_running_now(&self) -> crate::Result<bool> {
        let job_id = self
            .descriptor
            .require_job_id("check whether the cluster is running")?;
        Ok(self.ctx.adapter().is_running(job_id))
    }

    fn check_interrupt(&self, job_id: &str) -> crate::Result<()> {
        if self.ctx.interrupt().is_raised() {
            return Err(crate::Error::Interrupted {
                job_id: job_id.to_string(),
            });
        }
        Ok(())
    }

    /// Polls the scheduler until the job runs, submitting it first if needed.
    ///
    /// Returns `false` when `timeout` elapses before the job starts.
    pub fn wait_until_started(&mut self, timeout: Duration) -> crate::Result<bool> {
        if self.descriptor.job_id().is_none() {
            self.submit()?;
        }
        let job_id = self
            .descriptor
            .require_job_id("wait for the cluster")?
            .to_string();
        if self.descriptor.status() == JobStatus::Stopped {
            return Err(crate::Error::ClusterStopped {
                job_id,
                operation: "wait for the cluster",
            });
        }

        let start = Instant::now();
        loop {
            self.check_interrupt(&job_id)?;
            if self.is_started()? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                log::warn!(
                    "Job {job_id} did not start within {}",
                    humantime::format_duration(timeout)
                );
                return Ok(false);
            }
            std::thread::sleep(self.ctx.poll_intervals().start);
        }
    }

    pub fn coordinator_endpoint(&mut self, timeout: Duration) -> crate::Result<String> {
        self.find_endpoint(EndpointKind::Coordinator, timeout)
    }

    pub fn web_ui_endpoint(&mut self, timeout: Duration) -> crate::Result<String> {
        self.find_endpoint(EndpointKind::WebUi, timeout)
    }

    fn find_endpoint(&mut self, kind: EndpointKind, timeout: Duration) -> crate::Result<String> {
        let job_id = self
            .descriptor
            .require_job_id("find the cluster endpoints")?
            .to_string();
        if self.descriptor.status() == JobStatus::Stopped {
            return Err(crate::Error::ClusterStopped {
                job_id,
                operation: "find the cluster endpoints",
            });
        }
        if !self.is_started()? {
            return Err(crate::Error::NotStarted {
                job_id,
                endpoint: kind,
            });
        }

        let start = Instant::now();
        loop {
            self.check_interrupt(&job_id)?;
            match self.ctx.adapter().peek(&self.descriptor) {
                Ok(output) => {
                    if let Some(endpoint) = kind.find(&output) {
                        log::debug!("Found the {kind} of job {job_id}: {endpoint}");
                        return Ok(endpoint.to_string());
                    }
                }
                Err(error) => log::debug!("Cannot read the output of job {job_id}: {error}"),
            }
            if start.elapsed() >= timeout {
                return Err(crate::Error::EndpointNotFound {
                    job_id,
                    endpoint: kind,
                    waited: timeout,
                });
            }
            std::thread::sleep(self.ctx.poll_intervals().endpoint);
        }
    }

    /// Cancels the job and records it as stopped. Stopping a stopped job only persists it again.
    pub fn stop(&mut self) -> crate::Result<()> {
        let job_id = self
            .descriptor
            .require_job_id("stop the cluster")?
            .to_string();
        if self.descriptor.status() != JobStatus::Stopped {
            self.ctx.adapter().kill(&job_id);
        }
        self.descriptor.advance(JobStatus::Stopped);
        self.ctx.store().save(&self.descriptor)?;
        log::info!("Cluster job {job_id} stopped");
        Ok(())
    }
}

/// Stops the wrapped cluster when dropped, unless it was released.
///
/// Used by interactive sessions so that an interrupted session does not leave its allocation
/// behind.
pub struct ClusterGuard<'a> {
    job: Option<ClusterJob<'a>>,
}

impl<'a> ClusterGuard<'a> {
    pub fn new(job: ClusterJob<'a>) -> Self {
        Self { job: Some(job) }
    }

    /// Gives up the guard, the cluster keeps running.
    pub fn release(mut self) -> ClusterJob<'a> {
        // The option is only emptied here and in drop
        self.job.take().unwrap()
    }
}

impl<'a> Deref for ClusterGuard<'a> {
    type Target = ClusterJob<'a>;

    fn deref(&self) -> &Self::Target {
        self.job.as_ref().unwrap()
    }
}

impl DerefMut for ClusterGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.job.as_mut().unwrap()
    }
}

impl Drop for ClusterGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut job) = self.job.take() {
            if job.job_id().is_some() && job.status() != JobStatus::Stopped {
                if let Err(error) = job.stop() {
                    log::error!("Cannot stop the cluster: {error}");
                }
            }
        }
    }
}
