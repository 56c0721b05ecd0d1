use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Step of the migration a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Provision,
    Install,
    Backup,
    Promote,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Provision => "provision",
            Self::Install => "install",
            Self::Backup => "backup",
            Self::Promote => "promote",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single external process.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {status}{}", stderr_detail(.stderr))]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

fn stderr_detail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("could not resolve {tool}: {detail}")]
    Resolution { tool: String, detail: String },

    #[error("environment creation failed")]
    Provisioning {
        #[source]
        source: CommandError,
    },

    #[error("installing package '{package}' failed")]
    Install {
        package: String,
        #[source]
        source: CommandError,
    },

    #[error("archived environment already exists: {}", .path.display())]
    BackupCollision { path: PathBuf },

    #[error("failed to archive environment at {}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to promote new environment; it was left at {}", .scratch.display())]
    Promotion {
        scratch: PathBuf,
        /// Set when the replaced environment could not be moved back to `env/`.
        previous: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error("{stage} step failed on {}", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MigrationError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Resolution { .. } => Stage::Resolve,
            Self::Provisioning { .. } => Stage::Provision,
            Self::Install { .. } => Stage::Install,
            Self::BackupCollision { .. } | Self::Backup { .. } => Stage::Backup,
            Self::Promotion { .. } => Stage::Promote,
            Self::Io { stage, .. } => *stage,
        }
    }
}
