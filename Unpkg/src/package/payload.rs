//! Locating the data stream inside a package

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Uncompressed legacy archive suffix.
pub const PAX_SUFFIX: &str = ".pax";
/// gzip-compressed legacy archive suffix.
pub const PAX_GZ_SUFFIX: &str = ".pax.gz";
/// Exact file name of a payload inside an expanded container.
pub const PAYLOAD_NAME: &str = "Payload";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Archive found inside a legacy bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyArchive {
    pub path: PathBuf,
    /// The archive carries the `.pax.gz` suffix.
    pub compressed: bool,
}

/// Find the first pax archive under `bundle`.
///
/// Each directory's files are checked, in file-name order, before any of its
/// subdirectories are entered.
///
/// # Errors
/// Returns [`Error::PayloadNotFound`] if the bundle holds no `.pax` or `.pax.gz` file.
pub fn find_legacy_archive(bundle: &Path) -> Result<LegacyArchive> {
    let walker = WalkDir::new(bundle).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let compressed = name.ends_with(PAX_GZ_SUFFIX);
        if compressed || name.ends_with(PAX_SUFFIX) {
            debug!("legacy archive: {}", entry.path().display());
            return Ok(LegacyArchive {
                path: entry.into_path(),
                compressed,
            });
        }
    }

    Err(Error::PayloadNotFound {
        path: bundle.to_path_buf(),
        expected: "a pax archive",
    })
}

/// Every file named exactly `Payload` under `root`, in file-name order.
pub fn find_payloads(root: &Path) -> Result<Vec<PathBuf>> {
    let mut payloads = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == PAYLOAD_NAME {
            debug!("payload: {}", entry.path().display());
            payloads.push(entry.into_path());
        }
    }
    Ok(payloads)
}

/// Name for a payload's own subdirectory: its enclosing folder without extension.
///
/// `work/Tools.pkg/Payload` becomes `Tools`.
pub fn component_name(payload: &Path) -> String {
    payload
        .parent()
        .and_then(|p| p.file_stem().or_else(|| p.file_name()))
        .map_or_else(
            || PAYLOAD_NAME.to_string(),
            |n| n.to_string_lossy().to_string(),
        )
}

/// True if `path` starts with the gzip magic.
pub fn is_gzip(path: &Path) -> Result<bool> {
    let mut header = Vec::with_capacity(GZIP_MAGIC.len());
    File::open(path)?
        .take(GZIP_MAGIC.len() as u64)
        .read_to_end(&mut header)?;
    Ok(header == GZIP_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_first_archive_wins() {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().join("Contents/Resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(dir.path().join("Contents/Archive.pax.gz"), b"gz").unwrap();
        fs::write(resources.join("Other.pax"), b"pax").unwrap();

        let archive = find_legacy_archive(dir.path()).unwrap();
        assert_eq!(archive.path, dir.path().join("Contents/Archive.pax.gz"));
        assert!(archive.compressed);
    }

    #[test]
    fn test_files_checked_before_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        let contents = dir.path().join("Contents");
        fs::create_dir_all(contents.join("A Folder")).unwrap();
        fs::write(contents.join("A Folder/Extra.pax"), b"pax").unwrap();
        fs::write(contents.join("Archive.pax.gz"), b"gz").unwrap();

        let archive = find_legacy_archive(dir.path()).unwrap();
        assert_eq!(archive.path, contents.join("Archive.pax.gz"));
    }

    #[test]
    fn test_plain_pax_is_uncompressed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Archive.pax"), b"pax").unwrap();

        let archive = find_legacy_archive(dir.path()).unwrap();
        assert!(!archive.compressed);
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Info.plist"), b"<plist/>").unwrap();
        fs::create_dir(dir.path().join("Archive.pax")).unwrap();

        let err = find_legacy_archive(dir.path()).unwrap_err();
        assert!(matches!(err, Error::PayloadNotFound { expected: "a pax archive", .. }));
    }

    #[test]
    fn test_payloads_matched_by_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        for component in ["B.pkg", "A.pkg"] {
            fs::create_dir(dir.path().join(component)).unwrap();
            fs::write(dir.path().join(component).join("Payload"), b"x").unwrap();
        }
        fs::write(dir.path().join("A.pkg/Payload.bak"), b"x").unwrap();
        fs::write(dir.path().join("payload"), b"x").unwrap();

        let payloads = find_payloads(dir.path()).unwrap();
        assert_eq!(
            payloads,
            vec![dir.path().join("A.pkg/Payload"), dir.path().join("B.pkg/Payload")]
        );
    }

    #[test]
    fn test_component_name_strips_extension() {
        assert_eq!(component_name(Path::new("/w/Tools.pkg/Payload")), "Tools");
        assert_eq!(component_name(Path::new("/w/Docs/Payload")), "Docs");
    }

    #[test]
    fn test_gzip_sniffing() {
        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("gz");
        let raw = dir.path().join("raw");
        let empty = dir.path().join("empty");
        fs::write(&gz, [0x1f, 0x8b, 0x08, 0x00]).unwrap();
        fs::write(&raw, b"070707").unwrap();
        fs::write(&empty, b"").unwrap();

        assert!(is_gzip(&gz).unwrap());
        assert!(!is_gzip(&raw).unwrap());
        assert!(!is_gzip(&empty).unwrap());
    }
}
