use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::cluster::ClusterContext;
use crate::cluster::descriptor::{JobDescriptor, JobStatus};

/// A cluster that has a record in the store and is known to the scheduler.
#[derive(Clone, Debug, Serialize)]
pub struct ClusterEntry {
    pub index: usize,
    pub descriptor: JobDescriptor,
    /// Status as reported by the scheduler listing
    pub scheduler_status: String,
}

impl ClusterEntry {
    pub fn job_id(&self) -> &str {
        // Only submitted descriptors are stored
        self.descriptor.job_id().unwrap_or_default()
    }
}

/// Scheduler job ids grow with submission time, so numeric ids are compared as numbers.
fn compare_job_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Reconciles the stored cluster records with the jobs that the scheduler knows about.
pub struct ClusterRegistry<'a> {
    ctx: &'a ClusterContext,
}

impl<'a> ClusterRegistry<'a> {
    pub fn new(ctx: &'a ClusterContext) -> Self {
        Self { ctx }
    }

    /// Returns the clusters that are alive right now, oldest first.
    /// The position in the result is the cluster index.
    ///
    /// Records of jobs unknown to the scheduler are skipped but kept in the store.
    pub fn current_clusters(&self) -> crate::Result<Vec<ClusterEntry>> {
        let live_jobs: HashMap<String, String> = self
            .ctx
            .adapter()
            .list_current_jobs()?
            .into_iter()
            .map(|job| (job.job_id, job.status))
            .collect();

        let mut job_ids: Vec<String> = self
            .ctx
            .store()
            .list_all()?
            .into_iter()
            .filter(|job_id| live_jobs.contains_key(job_id))
            .collect();
        job_ids.sort_by(|a, b| compare_job_ids(a, b));

        let mut entries = Vec::with_capacity(job_ids.len());
        for job_id in job_ids {
            let descriptor = match self.ctx.store().load(&job_id) {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    log::warn!("Ignoring the record of job {job_id}: {error}");
                    continue;
                }
            };
            if descriptor.status() == JobStatus::Stopped {
                log::debug!("Job {job_id} was stopped, but the scheduler still lists it");
                continue;
            }
            let scheduler_status = live_jobs.get(&job_id).cloned().unwrap_or_default();
            entries.push(ClusterEntry {
                index: entries.len(),
                descriptor,
                scheduler_status,
            });
        }
        log::debug!("Found {} running cluster(s)", entries.len());
        Ok(entries)
    }

    /// Translates a cluster index into the job id of that cluster.
    pub fn resolve_index(&self, index: usize) -> crate::Result<String> {
        let clusters = self.current_clusters()?;
        let count = clusters.len();
        clusters
            .into_iter()
            .nth(index)
            .map(|entry| entry.job_id().to_string())
            .ok_or(crate::Error::ClusterNotFound { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::compare_job_ids;
    use std::cmp::Ordering;

    #[test]
    fn test_numeric_job_ids() {
        assert_eq!(compare_job_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_job_ids("100", "20"), Ordering::Greater);
    }

    #[test]
    fn test_mixed_job_ids() {
        assert_eq!(compare_job_ids("12", "abc"), Ordering::Less);
        assert_eq!(compare_job_ids("b", "a"), Ordering::Greater);
    }
}
