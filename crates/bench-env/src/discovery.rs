use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs_gateway::Filesystem;

/// A source checkout under `apps/` that can be installed in editable mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub name: String,
    pub path: PathBuf,
}

/// Lists installable packages under `apps_dir`.
///
/// Only immediate subdirectories holding one of `manifest_files` qualify; everything
/// else is skipped. A missing `apps_dir` yields no packages. Entries keep the
/// platform's listing order unless `sorted` is set.
pub fn discover_packages<F: Filesystem + ?Sized>(
    fs: &F,
    apps_dir: &Path,
    manifest_files: &[String],
    sorted: bool,
) -> io::Result<Vec<LocalPackage>> {
    if !fs.is_dir(apps_dir) {
        debug!("no apps directory at {}", apps_dir.display());
        return Ok(Vec::new());
    }

    let mut packages = Vec::new();
    for path in fs.read_dir(apps_dir)? {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            continue;
        };
        if !fs.is_dir(&path) {
            debug!("skipping {name}: not a directory");
            continue;
        }
        if !manifest_files
            .iter()
            .any(|manifest| fs.exists(&path.join(manifest)))
        {
            debug!("skipping {name}: no package manifest");
            continue;
        }
        packages.push(LocalPackage { name, path });
    }

    if sorted {
        packages.sort_by(|left, right| left.name.cmp(&right.name));
    }
    Ok(packages)
}
