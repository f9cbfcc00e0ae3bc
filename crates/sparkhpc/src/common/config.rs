use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::scheduler::SchedulerKind;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Job script templates used instead of the built-in ones.
#[derive(Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateOverrides {
    #[serde(default)]
    pub lsf: Option<PathBuf>,
    #[serde(default)]
    pub slurm: Option<PathBuf>,
}

impl TemplateOverrides {
    pub fn get(&self, kind: SchedulerKind) -> Option<&Path> {
        match kind {
            SchedulerKind::Lsf => self.lsf.as_deref(),
            SchedulerKind::Slurm => self.slurm.as_deref(),
        }
    }
}

/// Optional settings file, by default `<store-dir>/config.toml`.
/// Command line options and environment variables take precedence over it.
#[derive(Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SparkHpcConfig {
    /// Scheduler to use instead of detecting it
    #[serde(default)]
    pub scheduler: Option<SchedulerKind>,
    /// Directory with the scheduler executables, `$PATH` is searched if not set
    #[serde(default)]
    pub scheduler_bin_dir: Option<PathBuf>,
    #[serde(default)]
    pub templates: TemplateOverrides,
}

impl SparkHpcConfig {
    pub fn parse(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the configuration file at `path`.
    ///
    /// A missing file yields the default configuration, unless `required` is set.
    pub fn load(path: &Path, required: bool) -> crate::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("Loading configuration from {}", path.display());
                Self::parse(&content).map_err(|error| {
                    crate::Error::DeserializationError(format!(
                        "Invalid configuration file {}: {error}",
                        path.display()
                    ))
                })
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(Self::default())
            }
            Err(error) => Err(crate::Error::GenericError(format!(
                "Cannot read configuration file {}: {error}",
                path.display()
            ))),
        }
    }
}
