use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use bench_core::MigrateConfig;
use bench_env::{
    list_archived_envs, BenchLayout, LocalFilesystem, MigrationRequest, Migrator, SystemRunner,
    Toolchain,
};

use crate::completion::{resolve_completion_shell, write_completions_script};
use crate::render::{
    current_output_style, format_archived_env_lines, format_migration_report_lines,
    format_plan_lines, InstallProgress, TerminalRenderer,
};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let layout = BenchLayout::new(cli.bench_path);

    match cli.command {
        Commands::MigrateEnv {
            runtime,
            disable_backup,
            dry_run,
            config,
        } => {
            let config = load_migrate_config(&layout, config.as_deref())?;
            let request = MigrationRequest {
                runtime: runtime.into(),
                backup: !disable_backup,
            };
            run_migrate_env_command(&layout, &config, request, dry_run)?;
        }
        Commands::ArchivedEnvs => {
            let archived = list_archived_envs(&layout).with_context(|| {
                format!(
                    "failed to list {}",
                    layout.archived_envs_dir().display()
                )
            })?;
            for line in format_archived_env_lines(&archived) {
                println!("{line}");
            }
        }
        Commands::Completions { shell } => {
            let shell_env = std::env::var("SHELL").ok();
            let shell = resolve_completion_shell(shell, shell_env.as_deref(), cfg!(windows));
            write_completions_script(shell, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

pub(crate) fn load_migrate_config(
    layout: &BenchLayout,
    explicit: Option<&Path>,
) -> Result<MigrateConfig> {
    match explicit {
        Some(path) => MigrateConfig::load(path),
        None => MigrateConfig::load_or_default(&layout.config_path()),
    }
}

fn run_migrate_env_command(
    layout: &BenchLayout,
    config: &MigrateConfig,
    request: MigrationRequest,
    dry_run: bool,
) -> Result<()> {
    let toolchain = Toolchain::resolve(request.runtime, config)?;
    let renderer = TerminalRenderer::from_style(current_output_style());

    if dry_run {
        let plan = Migrator::new(layout, config, SystemRunner, LocalFilesystem)
            .plan(&toolchain, request)?;
        renderer.print_section("Migration plan");
        renderer.print_lines(&format_plan_lines(&plan));
        return Ok(());
    }

    let mut progress = InstallProgress::new(renderer);
    let outcome = Migrator::new(layout, config, SystemRunner, LocalFilesystem)
        .with_observer(|event| progress.observe(event))
        .run(&toolchain, request);

    match outcome {
        Ok(report) => {
            progress.finish();
            for line in format_migration_report_lines(&report, request) {
                renderer.print_status("ok", &line);
            }
            Ok(())
        }
        Err(err) => {
            progress.abandon();
            Err(err.into())
        }
    }
}
