//! Extraction directory selection

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Pick a fresh directory to extract `package` into.
///
/// The natural choice sits next to the package and is named after it without
/// its extension (`/Downloads/Tool.pkg` -> `/Downloads/Tool`). When the parent
/// folder is not writable, `fallback_dir` is used instead. Taken names get a
/// `-1`, `-2`, ... suffix up to `max_suffix`.
///
/// Nothing is created; the caller owns the returned path.
///
/// # Errors
/// Returns [`Error::ResourceExhausted`] when the plain name and every suffix
/// up to `max_suffix` already exist.
pub fn resolve_extraction_dir(
    package: &Path,
    fallback_dir: &Path,
    max_suffix: u32,
) -> Result<PathBuf> {
    let name = package_stem(package);
    let mut parent = package_parent(package);

    if !is_writable_dir(&parent) {
        warn!(
            "{} is not writable, extracting to {}",
            parent.display(),
            fallback_dir.display()
        );
        parent = fallback_dir.to_path_buf();
    }

    unique_child(&parent, &name, max_suffix).ok_or_else(|| Error::ResourceExhausted {
        path: package.to_path_buf(),
        limit: max_suffix,
    })
}

/// First of `parent/name`, `parent/name-1`, ... `parent/name-<max_suffix>`
/// that does not exist yet, or `None` when every one is taken.
pub fn unique_child(parent: &Path, name: &str, max_suffix: u32) -> Option<PathBuf> {
    let candidate = parent.join(name);
    if !candidate.exists() {
        return Some(candidate);
    }

    (1..=max_suffix)
        .map(|suffix| parent.join(format!("{name}-{suffix}")))
        .find(|candidate| !candidate.exists())
        .inspect(|candidate| debug!("{name} taken, using {}", candidate.display()))
}

/// File name of `path` with its last extension removed.
pub fn package_stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn package_parent(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check writability by creating (and immediately removing) a temp file.
fn is_writable_dir(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".unpkg-write-check")
        .tempfile_in(dir)
        .is_ok()
}
