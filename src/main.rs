use std::process::ExitCode;

use clap::{Parser, Subcommand};

use patchline::ReplayError;
use patchline::telemetry::{self, LogFormat};

mod commands;

/// Replay patch files as an evenly spread commit history
///
/// patchline takes two directories of email-style patches (for example the
/// output of `git format-patch`), interleaves them, and commits them one at
/// a time into a working repository. Each commit gets a contributor from a
/// percentage-weighted, shuffled list and a timestamp evenly spaced across
/// a configured date window. The branch is pushed once at the end.
///
/// QUICK START:
///
///   # Describe sources, contributors and the window in patchline.toml
///   patchline check
///
///   # See who commits what, and when, without touching git
///   patchline plan --seed 7
///
///   # Apply, commit and push
///   patchline run --seed 7
///
/// The run stops at the first failure and leaves the repository as it is;
/// restore it (e.g. `git reset --hard`) before running again.
#[derive(Parser)]
#[command(name = "patchline")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'patchline <command> --help' for more information on a specific command.")]
struct Cli {
    /// Diagnostic log format on stderr (filter with RUST_LOG)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply, commit and push the scheduled patches
    ///
    /// Prints each patch's file name, author and date before applying it,
    /// so the last block printed names the patch that failed.
    Run(commands::RunArgs),

    /// Print the commit schedule without touching git
    ///
    /// Use the same --seed as the eventual run to preview its exact
    /// author assignment.
    Plan(commands::PlanArgs),

    /// Validate the configuration and count the available patches
    Check(commands::CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    let result = match cli.command {
        Commands::Run(ref args) => commands::run(args),
        Commands::Plan(ref args) => commands::plan(args),
        Commands::Check(ref args) => commands::check(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(replay) = err.downcast_ref::<ReplayError>() {
                eprintln!("error: {replay}");
                ExitCode::from(replay.exit_code())
            } else {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        }
    }
}
