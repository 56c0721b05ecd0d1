use std::fs;
use std::io;
use std::path::PathBuf;

use bench_core::parse_archive_tag;
use chrono::NaiveDateTime;

use crate::layout::BenchLayout;

/// A previous environment kept under `archived_envs/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedEnv {
    pub tag: String,
    pub path: PathBuf,
    /// `None` when the directory name is not a timestamp tag.
    pub created_at: Option<NaiveDateTime>,
}

/// Archived environments, newest first. Empty when nothing was ever archived.
pub fn list_archived_envs(layout: &BenchLayout) -> io::Result<Vec<ArchivedEnv>> {
    let dir = layout.archived_envs_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut archived = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let tag = entry.file_name().to_string_lossy().into_owned();
        archived.push(ArchivedEnv {
            created_at: parse_archive_tag(&tag),
            tag,
            path: entry.path(),
        });
    }

    archived.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.tag.cmp(&left.tag))
    });
    Ok(archived)
}
