use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::client::commands::bootstrap::StartClusterOpts;
use crate::client::commands::connect::ConnectInfoOpts;
use crate::client::commands::start::StartOpts;
use crate::client::commands::stop::StopOpts;
use crate::client::commands::submit::SubmitOpts;
use crate::client::output::outputs::Outputs;
use crate::common::env::{
    SPARKHPC_CONFIG, SPARKHPC_DEBUG, SPARKHPC_DIR, SPARKHPC_OUTPUT_MODE, SPARKHPC_SCHEDULER,
};

#[derive(clap::ValueEnum, Clone)]
pub enum ColorPolicy {
    /// Use colors if the stdout is detected to be a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchedulerOpt {
    /// Look for the submit command of a known scheduler in `$PATH`.
    Detect,
    /// IBM Spectrum LSF (`bsub`)
    Lsf,
    /// SLURM (`sbatch`)
    Slurm,
}

// Common CLI options
#[derive(Parser)]
pub struct CommonOpts {
    /// The directory where cluster records are stored
    #[arg(
        long,
        value_hint = clap::ValueHint::DirPath,
        global = true,
        env = SPARKHPC_DIR,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub store_dir: Option<PathBuf>,

    /// Batch scheduler that runs the clusters.
    /// If not set, it is taken from the configuration file or detected.
    #[arg(
        long,
        value_enum,
        global = true,
        env = SPARKHPC_SCHEDULER,
        help_heading("GLOBAL OPTIONS")
    )]
    pub scheduler: Option<SchedulerOpt>,

    /// Path to the configuration file [default: <store-dir>/config.toml]
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = SPARKHPC_CONFIG,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub config: Option<PathBuf>,

    /// Sets console color policy
    #[arg(
        long,
        default_value_t = ColorPolicy::Auto,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub colors: ColorPolicy,

    /// Sets output formatting
    #[arg(
        long,
        env = SPARKHPC_OUTPUT_MODE,
        default_value_t = Outputs::CLI,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub output_mode: Outputs,

    /// Enables more detailed log output
    #[arg(
        long,
        env = SPARKHPC_DEBUG,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub debug: bool,
}

// Root CLI options
#[derive(Parser)]
#[command(
    name = "sparkcluster",
    author,
    about,
    version(crate::SPARKHPC_VERSION),
    disable_help_subcommand(true),
    help_expected(true)
)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Submit a new Spark cluster to the batch scheduler
    Submit(SubmitOpts),
    /// Print the endpoints of a running cluster
    ConnectInfo(ConnectInfoOpts),
    /// List clusters that are currently known to the scheduler
    List,
    /// Stop running cluster(s)
    Stop(StopOpts),
    /// Submit a cluster and keep it running until this command is interrupted
    Start(StartOpts),
    /// Start the cluster processes inside a job allocation
    #[command(hide = true)]
    StartCluster(StartClusterOpts),
    /// Generate shell completion script
    GenerateCompletion(GenerateCompletionOpts),
}

#[derive(Parser)]
pub struct GenerateCompletionOpts {
    /// Shell flavour for which the completion script should be generated
    #[arg(value_enum)]
    pub shell: Shell,
}
