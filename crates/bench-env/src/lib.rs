mod archive;
mod discovery;
mod error;
mod fs_gateway;
mod layout;
mod migrate;
mod process;
mod toolchain;

pub use archive::{list_archived_envs, ArchivedEnv};
pub use discovery::{discover_packages, LocalPackage};
pub use error::{CommandError, MigrationError, Stage};
pub use fs_gateway::{Filesystem, LocalFilesystem, ScratchDir};
pub use layout::BenchLayout;
pub use migrate::{
    BackupPlan, MigrationEvent, MigrationPlan, MigrationReport, MigrationRequest, Migrator,
};
pub use process::{Invocation, ProcessRunner, SystemRunner};
pub use toolchain::{installer_path, Toolchain};
