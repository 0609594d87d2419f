// Path utilities for root-relative matching and cycle detection
// All functions here are lexical; none of them touch the filesystem except
// DirIdentity, which stats exactly one directory.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::GhostError;

/// Clean a path by removing redundant components like "." and ".."
/// without requiring the path to exist.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                    continue;
                }
                components.push(component);
            }
            _ => components.push(component),
        }
    }

    let mut result = PathBuf::new();
    for component in components {
        result.push(component);
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Compute the root-relative form of `path` with `/` separators, suitable as
/// matching input and as a display key. Purely lexical: `root` does not need
/// to exist on disk and no symlinks are resolved, so this cannot loop even
/// when `path` traverses a symlink cycle elsewhere in the tree.
///
/// Fails with `PathOutsideRoot` when `root` is not a prefix of `path`.
pub fn rel_path_string(path: &Path, root: &Path) -> Result<String, GhostError> {
    let clean = clean_path(path);
    let clean_root = clean_path(root);

    let relative = clean.strip_prefix(&clean_root).map_err(|_| GhostError::PathOutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    // Non-UTF-8 segments go through lossy conversion; matching operates on
    // the lossy form while callers keep the real PathBuf.
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    Ok(segments.join("/"))
}

/// A resolved, symlink-independent identity for a directory, used to detect
/// traversal cycles: a directory whose identity has already been visited in
/// the current walk is not re-entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirIdentity {
    #[cfg(unix)]
    DevInode(u64, u64),
    Canonical(PathBuf),
}

impl DirIdentity {
    /// Identity from already-fetched metadata (Unix: device + inode pair).
    /// Falls back to the canonical path where inodes are unavailable.
    pub fn of(path: &Path, metadata: &Metadata) -> io::Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let _ = path;
            Ok(DirIdentity::DevInode(metadata.dev(), metadata.ino()))
        }
        #[cfg(not(unix))]
        {
            let _ = metadata;
            Ok(DirIdentity::Canonical(path.canonicalize()?))
        }
    }
}
