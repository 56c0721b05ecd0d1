use std::path::{Path, PathBuf};

use bench_core::CONFIG_FILE_NAME;

/// Fixed directory layout of a bench install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchLayout {
    root: PathBuf,
}

impl BenchLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join("apps")
    }

    pub fn env_dir(&self) -> PathBuf {
        self.root.join("env")
    }

    pub fn archived_envs_dir(&self) -> PathBuf {
        self.root.join("archived_envs")
    }

    pub fn archived_env_path(&self, tag: &str) -> PathBuf {
        self.archived_envs_dir().join(tag)
    }

    /// Sibling name the active env passes through on its way into `archived_envs`.
    pub fn staged_backup_path(&self, tag: &str) -> PathBuf {
        self.root.join(tag)
    }

    /// Where the active env waits while a replacement without backup is promoted.
    pub fn discarded_env_path(&self, tag: &str) -> PathBuf {
        self.root.join(format!(".env-discard-{tag}"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}
