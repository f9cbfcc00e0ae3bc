use std::time::Duration;

use thiserror::Error;

use crate::cluster::endpoint::EndpointKind;
use crate::common::error::SparkHpcError::GenericError;

#[derive(Debug, Error)]
pub enum SparkHpcError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    // Preconditions
    #[error("Environment variable {name} must be set to {operation}")]
    MissingEnvironment {
        name: &'static str,
        operation: &'static str,
    },
    #[error("Cannot submit cluster: it was already submitted as job {job_id}")]
    AlreadySubmitted { job_id: String },
    #[error("Cannot {operation}: the cluster was not submitted yet")]
    NotSubmitted { operation: &'static str },
    #[error("Cannot {operation}: cluster job {job_id} was already stopped")]
    ClusterStopped {
        job_id: String,
        operation: &'static str,
    },
    #[error("Cannot find the {endpoint} of job {job_id}: the job is not running yet")]
    NotStarted {
        job_id: String,
        endpoint: EndpointKind,
    },
    #[error("Invalid cluster parameters: {0}")]
    InvalidParameters(String),

    // Lookups
    #[error("No cluster record found for job {job_id}")]
    JobNotFound { job_id: String },
    #[error("Cluster {index} does not exist ({count} cluster(s) currently running)")]
    ClusterNotFound { index: usize, count: usize },

    #[error("Submission with `{program}` failed, no job id was assigned:\n{output}")]
    SubmissionError { program: String, output: String },
    #[error("The {endpoint} of job {job_id} was not found after {waited:?}; check the job output")]
    EndpointNotFound {
        job_id: String,
        endpoint: EndpointKind,
        waited: Duration,
    },
    #[error("Interrupted while waiting for job {job_id}")]
    Interrupted { job_id: String },
    #[error("Template error: {0}")]
    TemplateError(String),
    #[error("Error: {0}")]
    GenericError(String),
}

impl SparkHpcError {
    /// Lookup failures that a caller may want to branch on.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SparkHpcError::JobNotFound { .. } | SparkHpcError::ClusterNotFound { .. }
        )
    }
}

impl From<serde_json::error::Error> for SparkHpcError {
    fn from(e: serde_json::error::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for SparkHpcError {
    fn from(error: anyhow::Error) -> Self {
        Self::GenericError(format!("{error:?}"))
    }
}

impl From<toml::de::Error> for SparkHpcError {
    fn from(error: toml::de::Error) -> Self {
        Self::DeserializationError(error.to_string())
    }
}

pub fn error<T>(message: String) -> crate::Result<T> {
    Err(GenericError(message))
}

impl From<String> for SparkHpcError {
    fn from(e: String) -> Self {
        GenericError(e)
    }
}
