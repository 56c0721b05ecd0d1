use std::io::{self, IsTerminal};
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use bench_env::{
    ArchivedEnv, BackupPlan, MigrationError, MigrationEvent, MigrationPlan, MigrationReport,
    MigrationRequest, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if let Some(line) = render_section_header(self.style, title) {
            println!("{}", colorize(section_style(), &line));
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

/// Turns migration events into status lines, plus a progress bar on terminals.
pub(crate) struct InstallProgress {
    renderer: TerminalRenderer,
    progress_bar: Option<ProgressBar>,
}

impl InstallProgress {
    pub(crate) fn new(renderer: TerminalRenderer) -> Self {
        Self {
            renderer,
            progress_bar: None,
        }
    }

    pub(crate) fn observe(&mut self, event: &MigrationEvent) {
        match event {
            MigrationEvent::StageStarted(stage) => {
                self.finish();
                self.renderer.print_status("step", stage_message(*stage));
            }
            MigrationEvent::PackageInstalling { index, total, name } => {
                if self.renderer.style == OutputStyle::Plain {
                    self.renderer
                        .print_status("step", &format!("installing {name} ({index}/{total})"));
                    return;
                }
                let progress_bar = self
                    .progress_bar
                    .get_or_insert_with(|| start_progress_bar(*total as u64));
                progress_bar.set_message(name.clone());
            }
            MigrationEvent::PackageInstalled { .. } => {
                if let Some(progress_bar) = &self.progress_bar {
                    progress_bar.inc(1);
                }
            }
        }
    }

    pub(crate) fn finish(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }

    pub(crate) fn abandon(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.abandon();
        }
    }
}

fn start_progress_bar(total: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(total.max(1));
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan.bold} {msg:<16} [{bar:20.cyan/blue}] {pos:>3}/{len:3} {elapsed_precise}",
    ) {
        progress_bar.set_style(style.tick_chars(".oO@* ").progress_chars("=>-"));
    }
    progress_bar.enable_steady_tick(Duration::from_millis(80));
    progress_bar
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Resolve => "resolving executables",
        Stage::Provision => "creating new environment",
        Stage::Install => "reinstalling local packages",
        Stage::Backup => "archiving current environment",
        Stage::Promote => "activating new environment",
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("[{}] {message}", status.to_ascii_uppercase()),
    }
}

pub(crate) fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(format!("== {title} ==")),
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn error_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub(crate) fn format_plan_lines(plan: &MigrationPlan) -> Vec<String> {
    let toolchain = &plan.toolchain;
    let mut lines = vec![
        format!(
            "runtime: {} ({})",
            toolchain.runtime,
            toolchain.interpreter.display()
        ),
        format!("env tool: {}", toolchain.env_tool.display()),
        format!("scratch parent: {}", plan.scratch_parent.display()),
        format!("packages: {}", plan.packages.len()),
    ];
    for package in &plan.packages {
        lines.push(format!("  - {} ({})", package.name, package.path.display()));
    }
    lines.push(match &plan.backup {
        BackupPlan::Archive { destination } => {
            format!("current env: archive to {}", destination.display())
        }
        BackupPlan::Discard { path } => {
            format!("current env: discard {} (backup disabled)", path.display())
        }
        BackupPlan::Fresh => format!("current env: none at {}", plan.env_path.display()),
    });
    lines
}

pub(crate) fn format_migration_report_lines(
    report: &MigrationReport,
    request: MigrationRequest,
) -> Vec<String> {
    let mut lines = vec![format!(
        "environment at {} now runs {}",
        report.env_path.display(),
        report.runtime
    )];
    if report.installed.is_empty() {
        lines.push("no local packages to reinstall".to_string());
    } else {
        lines.push(format!(
            "reinstalled {} package(s): {}",
            report.installed.len(),
            report.installed.join(", ")
        ));
    }
    match (&report.backup, request.backup) {
        (Some(path), _) => lines.push(format!("previous env archived at {}", path.display())),
        (None, false) => lines.push("previous env discarded (backup disabled)".to_string()),
        (None, true) => {}
    }
    lines
}

pub(crate) fn format_archived_env_lines(archived: &[ArchivedEnv]) -> Vec<String> {
    if archived.is_empty() {
        return vec!["No archived environments".to_string()];
    }
    archived
        .iter()
        .map(|entry| match entry.created_at {
            Some(created_at) => format!(
                "{}  {}  {}",
                entry.tag,
                created_at.format("%Y-%m-%d %H:%M:%S"),
                entry.path.display()
            ),
            None => format!("{}  -  {}", entry.tag, entry.path.display()),
        })
        .collect()
}

/// Lines printed by the top-level error boundary.
pub(crate) fn format_failure_lines(err: &anyhow::Error) -> Vec<String> {
    let migration = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<MigrationError>());
    let Some(migration) = migration else {
        return vec![format!("error: {err:#}")];
    };

    let mut lines = vec![format!(
        "error: {} step failed: {err:#}",
        migration.stage()
    )];
    if let MigrationError::Promotion {
        scratch, previous, ..
    } = migration
    {
        lines.push(format!(
            "hint: the new environment was kept at {}; move it to env/ by hand",
            scratch.display()
        ));
        if let Some(previous) = previous {
            lines.push(format!(
                "hint: the previous environment could not be restored and is at {}",
                previous.display()
            ));
        }
    }
    lines
}

pub(crate) fn report_failure(err: &anyhow::Error) {
    log_failure(err);

    let rich = current_output_style() == OutputStyle::Rich && io::stderr().is_terminal();
    for line in format_failure_lines(err) {
        if rich {
            eprintln!("{}", colorize(error_style(), &line));
        } else {
            eprintln!("{line}");
        }
    }
}

/// Debug-level record of a failure; the user-facing copy goes to stderr once.
fn log_failure(err: &anyhow::Error) {
    match err
        .chain()
        .find_map(|cause| cause.downcast_ref::<MigrationError>())
    {
        Some(migration) => tracing::debug!("{} step failed: {err:?}", migration.stage()),
        None => tracing::debug!("command failed: {err:?}"),
    }
}
