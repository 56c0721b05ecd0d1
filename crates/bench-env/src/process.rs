use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::CommandError;

/// One external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn display_program(&self) -> String {
        self.program.display().to_string()
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.display_program()];
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.cwd);
        command
    }
}

/// Runs external commands for the migrator; non-zero exit is an error.
pub trait ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &mut R {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
        (**self).run(invocation)
    }
}

/// Blocking runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
        debug!(
            "running `{}` in {}",
            invocation.command_line(),
            invocation.cwd.display()
        );
        let output = invocation
            .to_command()
            .output()
            .map_err(|source| CommandError::Spawn {
                program: invocation.display_program(),
                source,
            })?;

        log_output(&invocation.program, &output.stdout);
        if output.status.success() {
            return Ok(());
        }

        Err(CommandError::Failed {
            program: invocation.display_program(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn log_output(program: &Path, stdout: &[u8]) {
    let name = program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    for line in String::from_utf8_lossy(stdout).lines() {
        debug!("[{name}] {line}");
    }
}
