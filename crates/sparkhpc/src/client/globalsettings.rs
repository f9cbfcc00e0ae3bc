use std::path::PathBuf;

use crate::client::output::outputs::Output;
use crate::cluster::ClusterContext;
use crate::cluster::interrupt::InterruptFlag;
use crate::cluster::store::DescriptorStore;
use crate::common::cli::SchedulerOpt;
use crate::common::config::{CONFIG_FILE_NAME, SparkHpcConfig};
use crate::common::env::{SPARK_HOME, read_env};
use crate::scheduler::{SchedulerKind, create_scheduler_adapter, detect_scheduler_kind};

pub struct GlobalSettings {
    store_dir: PathBuf,
    /// Explicitly requested configuration file
    config_path: Option<PathBuf>,
    scheduler: Option<SchedulerOpt>,
    printer: Box<dyn Output>,
}

impl GlobalSettings {
    pub fn new(
        store_dir: PathBuf,
        config_path: Option<PathBuf>,
        scheduler: Option<SchedulerOpt>,
        printer: Box<dyn Output>,
    ) -> Self {
        GlobalSettings {
            store_dir,
            config_path,
            scheduler,
            printer,
        }
    }

    pub fn printer(&self) -> &dyn Output {
        self.printer.as_ref()
    }

    pub fn load_config(&self) -> crate::Result<SparkHpcConfig> {
        match &self.config_path {
            Some(path) => SparkHpcConfig::load(path, true),
            None => SparkHpcConfig::load(&self.store_dir.join(CONFIG_FILE_NAME), false),
        }
    }

    /// Command line (or environment) first, then the configuration file, then detection.
    pub fn scheduler_kind(&self, config: &SparkHpcConfig) -> crate::Result<SchedulerKind> {
        let bin_dir = config.scheduler_bin_dir.as_deref();
        match (self.scheduler, config.scheduler) {
            (Some(SchedulerOpt::Lsf), _) => Ok(SchedulerKind::Lsf),
            (Some(SchedulerOpt::Slurm), _) => Ok(SchedulerKind::Slurm),
            (Some(SchedulerOpt::Detect), _) => detect_scheduler_kind(bin_dir),
            (None, Some(kind)) => Ok(kind),
            (None, None) => detect_scheduler_kind(bin_dir),
        }
    }

    /// Resolves everything that cluster operations need from the environment.
    pub fn create_cluster_context(&self, interrupt: InterruptFlag) -> crate::Result<ClusterContext> {
        let config = self.load_config()?;
        let kind = self.scheduler_kind(&config)?;
        log::debug!("Using the {kind} scheduler");

        let adapter = create_scheduler_adapter(kind, config.scheduler_bin_dir.clone());
        let store = DescriptorStore::open(&self.store_dir)?;
        let mut ctx = ClusterContext::new(adapter, store)
            .with_spark_home(read_env(SPARK_HOME).map(PathBuf::from))
            .with_interrupt(interrupt);
        for kind in [SchedulerKind::Lsf, SchedulerKind::Slurm] {
            if let Some(template) = config.templates.get(kind) {
                ctx = ctx.with_template_override(kind, template.to_path_buf());
            }
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::GlobalSettings;
    use crate::client::output::json::JsonOutput;
    use crate::common::cli::SchedulerOpt;
    use crate::common::config::SparkHpcConfig;
    use crate::scheduler::SchedulerKind;
    use tempfile::TempDir;

    fn settings(dir: &TempDir, scheduler: Option<SchedulerOpt>) -> GlobalSettings {
        GlobalSettings::new(
            dir.path().to_path_buf(),
            None,
            scheduler,
            Box::<JsonOutput>::default(),
        )
    }

    #[test]
    fn test_cli_scheduler_wins() {
        let dir = TempDir::new().unwrap();
        let config = SparkHpcConfig::parse("scheduler = \"lsf\"").unwrap();
        let gsettings = settings(&dir, Some(SchedulerOpt::Slurm));
        assert_eq!(
            gsettings.scheduler_kind(&config).unwrap(),
            SchedulerKind::Slurm
        );
    }

    #[test]
    fn test_config_scheduler() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "scheduler = \"slurm\"").unwrap();
        let gsettings = settings(&dir, None);
        let config = gsettings.load_config().unwrap();
        assert_eq!(
            gsettings.scheduler_kind(&config).unwrap(),
            SchedulerKind::Slurm
        );
    }

    #[test]
    fn test_detect_in_configured_bin_dir() {
        let dir = TempDir::new().unwrap();
        let bin_dir = dir.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        std::fs::write(bin_dir.join("sbatch"), "").unwrap();
        let config = SparkHpcConfig {
            scheduler_bin_dir: Some(bin_dir),
            ..Default::default()
        };
        let gsettings = settings(&dir, Some(SchedulerOpt::Detect));
        assert_eq!(
            gsettings.scheduler_kind(&config).unwrap(),
            SchedulerKind::Slurm
        );
    }

    #[test]
    fn test_create_context_with_template_override() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[templates]\nlsf = \"/home/user/spark.lsf\"\n",
        )
        .unwrap();
        let gsettings = settings(&dir, Some(SchedulerOpt::Lsf));
        let ctx = gsettings
            .create_cluster_context(Default::default())
            .unwrap();
        assert_eq!(ctx.adapter().kind(), SchedulerKind::Lsf);
        assert_eq!(
            ctx.template_override(SchedulerKind::Lsf),
            Some(std::path::Path::new("/home/user/spark.lsf"))
        );
        assert_eq!(ctx.template_override(SchedulerKind::Slurm), None);
    }
}
