//! Stable identifiers for files and tests.
//!
//! Ids are pure functions of paths and titles so that the same test gets the
//! same id in every run; history is joined on them.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Length of a file id and of the hash suffix of a test id.
pub const ID_LENGTH: usize = 20;

/// Separator between title path segments in the test id key.
const TITLE_SEPARATOR: char = '\x1e';

/// Hash bytes using SHA-256, lowercase hex.
pub fn content_hash(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

fn short_hash(data: impl AsRef<[u8]>) -> String {
    let mut hash = content_hash(data);
    hash.truncate(ID_LENGTH);
    hash
}

/// Convert a path to forward-slash form.
pub fn to_posix_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Absolute, lexically normalized form of `path`.
///
/// Relative paths are resolved against the working directory. `.` and `..`
/// are collapsed without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Express `path` relative to `base`, in forward-slash form.
///
/// Both sides are normalized first, so cwd-relative and `..` spellings of
/// the same file agree. Falls back to `..` segments when `path` is not below
/// `base`.
pub fn relative_posix_path(base: &Path, path: &Path) -> String {
    let base = normalize_path(base);
    let path = normalize_path(path);
    let relative = pathdiff::diff_paths(&path, &base).unwrap_or(path);
    to_posix_path(&relative.to_string_lossy())
}

/// Id of a test file, from its path relative to the project's test directory.
pub fn file_id(relative_path: &str) -> String {
    short_hash(to_posix_path(relative_path))
}

/// Id of a logical test: `{file_id}-{hash}`.
///
/// The hashed key is
/// `[project=<ordinal>]<file path>\x1e<title>\x1e...\x1e<title> (repeat:<index>)`.
/// The retry index of an attempt is not part of it.
pub fn test_id(
    file_id: &str,
    project_ordinal: usize,
    file_path: &str,
    titles: &[&str],
    repeat_index: u32,
) -> String {
    let mut key = format!("[project={}]{}", project_ordinal, to_posix_path(file_path));
    for title in titles {
        key.push(TITLE_SEPARATOR);
        key.push_str(title);
    }
    key.push_str(&format!(" (repeat:{})", repeat_index));

    format!("{}-{}", file_id, short_hash(key))
}

/// Numbers projects in the order they are first seen, starting at 1.
#[derive(Debug, Default)]
pub struct ProjectOrdinals {
    ordinals: HashMap<usize, usize>,
    last: usize,
}

impl ProjectOrdinals {
    /// Ordinal of the project at `project_index` in the run's project list.
    pub fn ordinal(&mut self, project_index: usize) -> usize {
        if let Some(ordinal) = self.ordinals.get(&project_index) {
            return *ordinal;
        }
        self.last += 1;
        self.ordinals.insert(project_index, self.last);
        self.last
    }
}
