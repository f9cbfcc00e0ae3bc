use std::io;
use std::io::IsTerminal;

use clap::{CommandFactory, FromArgMatches};
use clap_complete::generate;
use cli_table::ColorChoice;

use sparkhpc::client::commands::bootstrap::command_start_cluster;
use sparkhpc::client::commands::connect::command_connect_info;
use sparkhpc::client::commands::list::command_list;
use sparkhpc::client::commands::start::command_start;
use sparkhpc::client::commands::stop::command_stop;
use sparkhpc::client::commands::submit::command_submit;
use sparkhpc::client::globalsettings::GlobalSettings;
use sparkhpc::client::output::cli::CliOutput;
use sparkhpc::client::output::json::JsonOutput;
use sparkhpc::client::output::outputs::{Output, Outputs};
use sparkhpc::cluster::store::default_store_directory;
use sparkhpc::common::cli::{
    ColorPolicy, CommonOpts, GenerateCompletionOpts, RootOptions, SubCommand,
};
use sparkhpc::common::setup::setup_logging;
use sparkhpc::common::utils::fs::absolute_path;

fn make_global_settings(opts: CommonOpts) -> anyhow::Result<GlobalSettings> {
    let store_dir = absolute_path(opts.store_dir.unwrap_or_else(default_store_directory))?;

    let color_policy = match opts.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    // Create Printer
    let printer: Box<dyn Output> = match opts.output_mode {
        Outputs::CLI => {
            // Set colored public for CLI
            match color_policy {
                ColorChoice::Always | ColorChoice::AlwaysAnsi => {
                    colored::control::set_override(true)
                }
                ColorChoice::Never => colored::control::set_override(false),
                _ => {}
            }

            Box::new(CliOutput::new(color_policy))
        }
        Outputs::JSON => Box::<JsonOutput>::default(),
    };

    Ok(GlobalSettings::new(
        store_dir,
        opts.config,
        opts.scheduler,
        printer,
    ))
}

fn generate_completion(opts: GenerateCompletionOpts) -> anyhow::Result<()> {
    let generator = opts.shell;

    let mut app = RootOptions::command();
    eprintln!("Generating completion file for {generator}...");
    generate(generator, &mut app, "sparkcluster".to_string(), &mut io::stdout());
    Ok(())
}

fn main() -> sparkhpc::Result<()> {
    let matches = RootOptions::command().get_matches();
    let top_opts = match RootOptions::from_arg_matches(&matches) {
        Ok(opts) => opts,
        Err(error) => error.exit(),
    };

    setup_logging(top_opts.common.debug);

    let gsettings = match make_global_settings(top_opts.common) {
        Ok(gsettings) => gsettings,
        Err(error) => {
            eprintln!("{error:?}");
            std::process::exit(1);
        }
    };

    let result = match top_opts.subcmd {
        SubCommand::Submit(opts) => command_submit(&gsettings, opts),
        SubCommand::ConnectInfo(opts) => command_connect_info(&gsettings, opts),
        SubCommand::List => command_list(&gsettings),
        SubCommand::Stop(opts) => command_stop(&gsettings, opts),
        SubCommand::Start(opts) => command_start(&gsettings, opts),
        SubCommand::StartCluster(opts) => command_start_cluster(&gsettings, opts),
        SubCommand::GenerateCompletion(opts) => generate_completion(opts),
    };

    if let Err(e) = result {
        gsettings.printer().print_error(e);
        std::process::exit(1);
    }

    Ok(())
}
