use std::path::PathBuf;
use std::process::ExitCode;

use bench_core::RuntimeSpec;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

mod completion;
mod dispatch;
mod logging;
mod render;


#[derive(Parser, Debug)]
#[command(name = "bench", version)]
#[command(about = "Bench manager for locally checked-out apps", long_about = None)]
struct Cli {
    /// Root of the bench install
    #[arg(long, global = true, default_value = ".")]
    bench_path: PathBuf,
    /// Log more (-v for steps, -vv for command output)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the bench environment for another runtime version
    #[command(name = "migrate-env", visible_alias = "migrate-environment")]
    MigrateEnv {
        runtime: CliRuntime,
        /// Replace the current environment without archiving it
        #[arg(long, visible_alias = "no-backup")]
        disable_backup: bool,
        /// Print what would happen without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Config file to use instead of <bench-path>/migrate-env.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List environments archived by earlier migrations
    ArchivedEnvs,
    /// Print a shell completion script
    Completions { shell: Option<CliCompletionShell> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliRuntime {
    Python2,
    Python3,
}

impl From<CliRuntime> for RuntimeSpec {
    fn from(value: CliRuntime) -> Self {
        match value {
            CliRuntime::Python2 => Self::Python2,
            CliRuntime::Python3 => Self::Python3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliCompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match dispatch::run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            render::report_failure(&err);
            ExitCode::FAILURE
        }
    }
}
