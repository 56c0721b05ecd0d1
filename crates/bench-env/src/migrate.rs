use std::path::{Path, PathBuf};

use bench_core::{archive_tag, MigrateConfig, RuntimeSpec};
use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::discovery::{discover_packages, LocalPackage};
use crate::error::{MigrationError, Stage};
use crate::fs_gateway::{Filesystem, ScratchDir};
use crate::layout::BenchLayout;
use crate::process::{Invocation, ProcessRunner};
use crate::toolchain::{installer_path, Toolchain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationRequest {
    pub runtime: RuntimeSpec,
    pub backup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub runtime: RuntimeSpec,
    /// Package names in the order they were installed.
    pub installed: Vec<String>,
    pub backup: Option<PathBuf>,
    pub env_path: PathBuf,
}

/// What happens to the active environment when the new one is promoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupPlan {
    Archive { destination: PathBuf },
    Discard { path: PathBuf },
    /// There is no active environment to replace.
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub toolchain: Toolchain,
    pub packages: Vec<LocalPackage>,
    pub backup: BackupPlan,
    pub env_path: PathBuf,
    pub scratch_parent: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    StageStarted(Stage),
    PackageInstalling {
        index: usize,
        total: usize,
        name: String,
    },
    PackageInstalled {
        name: String,
    },
}

/// Where the previously active environment went before promotion.
enum Displaced {
    Nothing,
    Archived(PathBuf),
    Discarded(PathBuf),
}

type Observer<'a> = Box<dyn FnMut(&MigrationEvent) + 'a>;

/// Rebuilds a bench's environment for another runtime and swaps it into place.
pub struct Migrator<'a, R, F> {
    layout: &'a BenchLayout,
    config: &'a MigrateConfig,
    runner: R,
    fs: F,
    clock: fn() -> NaiveDateTime,
    observer: Option<Observer<'a>>,
}

impl<'a, R: ProcessRunner, F: Filesystem> Migrator<'a, R, F> {
    pub fn new(layout: &'a BenchLayout, config: &'a MigrateConfig, runner: R, fs: F) -> Self {
        Self {
            layout,
            config,
            runner,
            fs,
            clock: local_now,
            observer: None,
        }
    }

    /// Replaces the clock used for archive tags.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: impl FnMut(&MigrationEvent) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Works out what [`Migrator::run`] would do without changing anything.
    pub fn plan(
        &self,
        toolchain: &Toolchain,
        request: MigrationRequest,
    ) -> Result<MigrationPlan, MigrationError> {
        let packages = self.discover()?;
        let env_path = self.layout.env_dir();
        let tag = archive_tag((self.clock)());

        let backup = if !self.fs.exists(&env_path) {
            BackupPlan::Fresh
        } else if request.backup {
            let destination = self.layout.archived_env_path(&tag);
            self.ensure_vacant(&destination)?;
            self.ensure_vacant(&self.layout.staged_backup_path(&tag))?;
            BackupPlan::Archive { destination }
        } else {
            BackupPlan::Discard {
                path: env_path.clone(),
            }
        };

        Ok(MigrationPlan {
            toolchain: toolchain.clone(),
            packages,
            backup,
            env_path,
            scratch_parent: self.scratch_parent().to_path_buf(),
        })
    }

    /// Runs the migration after the toolchain has been resolved.
    ///
    /// The active environment is only touched once every package installed cleanly
    /// into the scratch environment.
    pub fn run(
        &mut self,
        toolchain: &Toolchain,
        request: MigrationRequest,
    ) -> Result<MigrationReport, MigrationError> {
        info!(
            "Migrating {} to {} (backup: {})",
            self.layout.root().display(),
            request.runtime,
            request.backup
        );

        self.emit(MigrationEvent::StageStarted(Stage::Provision));
        let scratch = self.acquire_scratch()?;
        self.provision(toolchain, &scratch)?;

        self.emit(MigrationEvent::StageStarted(Stage::Install));
        let installed = self.install_packages(&scratch)?;

        self.emit(MigrationEvent::StageStarted(Stage::Backup));
        let tag = archive_tag((self.clock)());
        let displaced = if request.backup {
            self.archive_active_env(&tag)?
        } else {
            self.discard_active_env(&tag)?
        };

        self.emit(MigrationEvent::StageStarted(Stage::Promote));
        let env_path = self.promote(scratch, &displaced)?;

        let backup = match displaced {
            Displaced::Archived(path) => Some(path),
            Displaced::Nothing | Displaced::Discarded(_) => None,
        };
        info!("Migration to {} successful", request.runtime);
        Ok(MigrationReport {
            runtime: request.runtime,
            installed,
            backup,
            env_path,
        })
    }

    fn emit(&mut self, event: MigrationEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    fn scratch_parent(&self) -> &Path {
        self.config
            .scratch_root
            .as_deref()
            .unwrap_or_else(|| self.layout.root())
    }

    fn acquire_scratch(&self) -> Result<ScratchDir, MigrationError> {
        let parent = self.scratch_parent();
        ScratchDir::create_in(parent).map_err(|source| MigrationError::Io {
            stage: Stage::Provision,
            path: parent.to_path_buf(),
            source,
        })
    }

    fn provision(
        &mut self,
        toolchain: &Toolchain,
        scratch: &ScratchDir,
    ) -> Result<(), MigrationError> {
        let env_path = scratch.env_path();
        info!(
            "Creating {} environment at {}",
            toolchain.runtime,
            env_path.display()
        );
        let invocation = Invocation::new(&toolchain.env_tool, scratch.path())
            .arg("--python")
            .arg(&toolchain.interpreter)
            .arg(&env_path);
        self.runner
            .run(&invocation)
            .map_err(|source| MigrationError::Provisioning { source })
    }

    fn discover(&self) -> Result<Vec<LocalPackage>, MigrationError> {
        let apps_dir = self.layout.apps_dir();
        discover_packages(
            &self.fs,
            &apps_dir,
            &self.config.manifest_files,
            self.config.sort_packages,
        )
        .map_err(|source| MigrationError::Io {
            stage: Stage::Install,
            path: apps_dir,
            source,
        })
    }

    fn install_packages(&mut self, scratch: &ScratchDir) -> Result<Vec<String>, MigrationError> {
        let packages = self.discover()?;
        let installer = installer_path(&scratch.env_path(), &self.config.installer);
        let total = packages.len();
        info!("Reinstalling {total} local package(s)");

        let mut installed = Vec::with_capacity(total);
        for (index, package) in packages.into_iter().enumerate() {
            self.emit(MigrationEvent::PackageInstalling {
                index: index + 1,
                total,
                name: package.name.clone(),
            });
            let invocation = Invocation::new(&installer, self.layout.root())
                .arg("install")
                .arg("-e")
                .arg(&package.path);
            self.runner
                .run(&invocation)
                .map_err(|source| MigrationError::Install {
                    package: package.name.clone(),
                    source,
                })?;
            debug!("installed {}", package.name);
            self.emit(MigrationEvent::PackageInstalled {
                name: package.name.clone(),
            });
            installed.push(package.name);
        }
        Ok(installed)
    }

    fn ensure_vacant(&self, path: &Path) -> Result<(), MigrationError> {
        if self.fs.exists(path) {
            return Err(MigrationError::BackupCollision {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Moves `env/` to `archived_envs/<tag>` by way of `<root>/<tag>`.
    fn archive_active_env(&self, tag: &str) -> Result<Displaced, MigrationError> {
        let env_path = self.layout.env_dir();
        if !self.fs.exists(&env_path) {
            info!(
                "No active environment at {}; nothing to archive",
                env_path.display()
            );
            return Ok(Displaced::Nothing);
        }

        let staged = self.layout.staged_backup_path(tag);
        let destination = self.layout.archived_env_path(tag);
        self.ensure_vacant(&destination)?;
        self.ensure_vacant(&staged)?;

        let archive_dir = self.layout.archived_envs_dir();
        self.fs
            .create_dir_all(&archive_dir)
            .map_err(|source| MigrationError::Backup {
                path: archive_dir.clone(),
                source,
            })?;

        info!("Backing up environment to {}", destination.display());
        self.fs
            .rename(&env_path, &staged)
            .map_err(|source| MigrationError::Backup {
                path: env_path.clone(),
                source,
            })?;
        if let Err(source) = self.fs.rename(&staged, &destination) {
            if let Err(err) = self.fs.rename(&staged, &env_path) {
                error!(
                    "failed to restore {} to {}: {err}",
                    staged.display(),
                    env_path.display()
                );
            }
            return Err(MigrationError::Backup {
                path: staged,
                source,
            });
        }
        Ok(Displaced::Archived(destination))
    }

    /// Moves `env/` aside so a failed promotion can put it back.
    fn discard_active_env(&self, tag: &str) -> Result<Displaced, MigrationError> {
        let env_path = self.layout.env_dir();
        if !self.fs.exists(&env_path) {
            return Ok(Displaced::Nothing);
        }

        let discarded = self.layout.discarded_env_path(tag);
        self.ensure_vacant(&discarded)?;
        self.fs
            .rename(&env_path, &discarded)
            .map_err(|source| MigrationError::Backup {
                path: env_path.clone(),
                source,
            })?;
        debug!("moved old environment aside to {}", discarded.display());
        Ok(Displaced::Discarded(discarded))
    }

    fn promote(
        &self,
        scratch: ScratchDir,
        displaced: &Displaced,
    ) -> Result<PathBuf, MigrationError> {
        let env_path = self.layout.env_dir();
        let scratch_env = scratch.env_path();
        info!("Activating new environment at {}", env_path.display());

        if let Err(source) = self.fs.rename(&scratch_env, &env_path) {
            let mut previous = None;
            if let Displaced::Discarded(old) = displaced {
                if let Err(err) = self.fs.rename(old, &env_path) {
                    error!(
                        "failed to restore previous environment from {}: {err}",
                        old.display()
                    );
                    previous = Some(old.clone());
                }
            }
            let kept = scratch.disarm().join("env");
            return Err(MigrationError::Promotion {
                scratch: kept,
                previous,
                source,
            });
        }

        if let Displaced::Discarded(old) = displaced {
            if let Err(err) = self.fs.remove_dir_all(old) {
                warn!(
                    "failed to remove previous environment at {}: {err}",
                    old.display()
                );
            }
        }
        drop(scratch);
        Ok(env_path)
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
