use std::path::{Path, PathBuf};

use bench_core::{MigrateConfig, RuntimeSpec};

use crate::error::MigrationError;

/// Executables a migration needs, resolved before anything is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub runtime: RuntimeSpec,
    pub interpreter: PathBuf,
    pub env_tool: PathBuf,
}

impl Toolchain {
    pub fn resolve(runtime: RuntimeSpec, config: &MigrateConfig) -> Result<Self, MigrationError> {
        Self::resolve_with_lookup(runtime, config, |name| {
            which::which(name).map_err(|err| err.to_string())
        })
    }

    /// Same as [`Toolchain::resolve`] with a custom `PATH` lookup.
    pub fn resolve_with_lookup<Lookup>(
        runtime: RuntimeSpec,
        config: &MigrateConfig,
        mut lookup: Lookup,
    ) -> Result<Self, MigrationError>
    where
        Lookup: FnMut(&str) -> Result<PathBuf, String>,
    {
        let interpreter = match config.runtime_override(runtime) {
            Some(path) => existing_file(runtime.as_str(), path)?,
            None => lookup(runtime.executable_name()).map_err(|detail| {
                MigrationError::Resolution {
                    tool: runtime.as_str().to_string(),
                    detail,
                }
            })?,
        };

        let tool = Path::new(&config.env_tool);
        let env_tool = if is_explicit_path(tool) {
            existing_file(&config.env_tool, tool)?
        } else {
            lookup(&config.env_tool).map_err(|detail| MigrationError::Resolution {
                tool: config.env_tool.clone(),
                detail,
            })?
        };

        Ok(Self {
            runtime,
            interpreter,
            env_tool,
        })
    }
}

/// Path of `installer` inside the environment rooted at `env_dir`.
pub fn installer_path(env_dir: &Path, installer: &str) -> PathBuf {
    if cfg!(windows) {
        env_dir.join("Scripts").join(format!("{installer}.exe"))
    } else {
        env_dir.join("bin").join(installer)
    }
}

fn is_explicit_path(path: &Path) -> bool {
    path.is_absolute() || path.components().count() > 1
}

fn existing_file(tool: &str, path: &Path) -> Result<PathBuf, MigrationError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    Err(MigrationError::Resolution {
        tool: tool.to_string(),
        detail: format!("configured path does not exist: {}", path.display()),
    })
}
