use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cluster::descriptor::JobDescriptor;
use crate::common::error::error;
use crate::common::utils::fs::{absolute_path, write_atomically};

const RECORD_EXTENSION: &str = "json";

pub fn default_store_directory() -> PathBuf {
    let mut home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    home.push(".sparkhpc");
    home
}

/// Directory holding one JSON record per submitted cluster job, named after its job id.
///
/// The directory is shared by all sessions of the same user. Records are replaced atomically,
/// but there is no locking beyond that.
#[derive(Clone, Debug)]
pub struct DescriptorStore {
    path: PathBuf,
}

impl DescriptorStore {
    /// Opens the store, creating the directory if it does not exist yet.
    pub fn open(directory: &Path) -> crate::Result<Self> {
        std::fs::create_dir_all(directory)?;
        let path = absolute_path(directory.to_path_buf())?;
        if !path.is_dir() {
            return error(format!("{} is not a directory", path.display()));
        }
        Ok(Self { path })
    }

    pub fn directory(&self) -> &Path {
        &self.path
    }

    pub fn record_path(&self, job_id: &str) -> crate::Result<PathBuf> {
        if job_id.is_empty() || job_id.contains(['/', '\\']) || job_id.starts_with('.') {
            return error(format!("Invalid job id `{job_id}`"));
        }
        Ok(self.path.join(format!("{job_id}.{RECORD_EXTENSION}")))
    }

    /// Writes the record of a submitted job, replacing its previous version.
    pub fn save(&self, descriptor: &JobDescriptor) -> crate::Result<()> {
        let job_id = descriptor.require_job_id("save the cluster record")?;
        let path = self.record_path(job_id)?;
        let content = serde_json::to_vec_pretty(descriptor)?;
        write_atomically(&path, &content)?;
        log::debug!("Cluster record of job {job_id} saved into {}", path.display());
        Ok(())
    }

    pub fn load(&self, job_id: &str) -> crate::Result<JobDescriptor> {
        let path = self.record_path(job_id)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(crate::Error::JobNotFound {
                    job_id: job_id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let descriptor: JobDescriptor = serde_json::from_reader(file).map_err(|e| {
            crate::Error::DeserializationError(format!(
                "Invalid cluster record {}: {e}",
                path.display()
            ))
        })?;
        if descriptor.job_id() != Some(job_id) {
            return error(format!(
                "Cluster record {} belongs to job {:?}, not to job {job_id}",
                path.display(),
                descriptor.job_id()
            ));
        }
        Ok(descriptor)
    }

    /// Returns the job ids of all stored records, whether the jobs are still alive or not.
    pub fn list_all(&self) -> crate::Result<Vec<String>> {
        let mut job_ids = vec![];
        for entry in std::fs::read_dir(&self.path)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }
            if let Some(job_id) = path.file_stem().and_then(|stem| stem.to_str()) {
                // Skip leftovers of interrupted writes and other hidden files
                if !job_id.starts_with('.') {
                    job_ids.push(job_id.to_string());
                }
            }
        }
        job_ids.sort_unstable();
        Ok(job_ids)
    }
}
