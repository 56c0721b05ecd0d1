use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::runtime::RuntimeSpec;

pub const CONFIG_FILE_NAME: &str = "migrate-env.toml";

const DEFAULT_ENV_TOOL: &str = "virtualenv";
const DEFAULT_INSTALLER: &str = "pip";
const DEFAULT_MANIFEST_FILE: &str = "setup.py";

/// Knobs for `migrate-env`, read from `migrate-env.toml` in the bench root.
///
/// Every field has a default, so a missing file behaves like an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateConfig {
    /// Environment-creation tool: a name looked up on `PATH` or an explicit path.
    #[serde(default = "default_env_tool")]
    pub env_tool: String,
    /// Package installer inside the new environment's executable directory.
    #[serde(default = "default_installer")]
    pub installer: String,
    /// A directory under `apps/` is installable when it contains one of these.
    #[serde(default = "default_manifest_files")]
    pub manifest_files: Vec<String>,
    #[serde(default)]
    pub sort_packages: bool,
    /// Parent of the scratch directory. Defaults to the bench root.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
    #[serde(default)]
    runtimes: BTreeMap<String, PathBuf>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            env_tool: default_env_tool(),
            installer: default_installer(),
            manifest_files: default_manifest_files(),
            sort_packages: false,
            scratch_root: None,
            runtimes: BTreeMap::new(),
        }
    }
}

impl MigrateConfig {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse migrate-env config")?;
        config.validated()
    }

    /// Reads an explicitly requested config file; a missing file is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw)
                .with_context(|| format!("invalid config file: {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read config file: {}", path.display())),
        }
    }

    /// Interpreter path pinned for `runtime`, bypassing the `PATH` lookup.
    pub fn runtime_override(&self, runtime: RuntimeSpec) -> Option<&Path> {
        self.runtimes.get(runtime.as_str()).map(PathBuf::as_path)
    }

    pub fn set_runtime_override(&mut self, runtime: RuntimeSpec, path: impl Into<PathBuf>) {
        self.runtimes
            .insert(runtime.as_str().to_string(), path.into());
    }

    fn validated(mut self) -> anyhow::Result<Self> {
        if self.env_tool.trim().is_empty() {
            return Err(anyhow!("env_tool must not be empty"));
        }
        if self.installer.trim().is_empty() {
            return Err(anyhow!("installer must not be empty"));
        }
        if self.manifest_files.is_empty() {
            return Err(anyhow!("manifest_files must list at least one file name"));
        }
        for name in &self.manifest_files {
            if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
                return Err(anyhow!(
                    "manifest file entry must be a bare file name: '{name}'"
                ));
            }
        }

        let mut runtimes = BTreeMap::new();
        for (key, path) in std::mem::take(&mut self.runtimes) {
            let Some(runtime) = RuntimeSpec::parse(&key) else {
                let supported = RuntimeSpec::all().map(RuntimeSpec::as_str).join(", ");
                return Err(anyhow!(
                    "unsupported runtime '{key}' in [runtimes] (expected one of: {supported})"
                ));
            };
            runtimes.insert(runtime.as_str().to_string(), path);
        }
        self.runtimes = runtimes;
        Ok(self)
    }
}

fn default_env_tool() -> String {
    DEFAULT_ENV_TOOL.to_string()
}

fn default_installer() -> String {
    DEFAULT_INSTALLER.to_string()
}

fn default_manifest_files() -> Vec<String> {
    vec![DEFAULT_MANIFEST_FILE.to_string()]
}
