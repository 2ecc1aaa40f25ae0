//! Metapackage (`.mpkg`) extraction

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::destination::package_stem;
use super::detect::{PACKAGE_SUFFIX, Package};
use super::extractor::Extractor;

/// Result of extracting every sub-package of a metapackage.
#[derive(Debug)]
pub struct MetapackageReport {
    /// The top-level destination. Removed when nothing was extracted.
    pub destination: PathBuf,
    /// Sub-packages extracted successfully, with their destinations.
    pub extracted: Vec<(PathBuf, PathBuf)>,
    /// Sub-packages that failed, with the reason.
    pub failures: Vec<(PathBuf, Error)>,
}

impl MetapackageReport {
    pub fn success_count(&self) -> usize {
        self.extracted.len()
    }
}

/// All `.pkg` entries (files and directories) under `metapackage`, in file-name order.
pub fn find_subpackages(metapackage: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(metapackage).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_name().to_string_lossy().ends_with(PACKAGE_SUFFIX) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

impl Extractor {
    /// Extract every sub-package of `metapackage` into its own folder under `dest`.
    ///
    /// Folders are named after the sub-package; a name already used by an
    /// earlier sub-package gets a `-N` suffix.
    ///
    /// A failing sub-package is recorded and the rest are still attempted.
    /// When none succeed, `dest` is removed again.
    ///
    /// # Errors
    /// Returns an error only if the metapackage cannot be walked or `dest`
    /// cannot be created; per-package failures land in the report.
    pub fn process_metapackage(&self, metapackage: &Path, dest: &Path) -> Result<MetapackageReport> {
        let subpackages = find_subpackages(metapackage)?;
        fs::create_dir_all(dest)?;

        let mut report = MetapackageReport {
            destination: dest.to_path_buf(),
            extracted: Vec::new(),
            failures: Vec::new(),
        };

        for subpackage in subpackages {
            let result = self
                .unique_folder(dest, &package_stem(&subpackage))
                .and_then(|sub_dest| {
                    let package = Package::open(&subpackage)?;
                    self.extract_package(&package, &sub_dest)
                });
            match result {
                Ok(outcome) => report.extracted.push((subpackage, outcome.destination)),
                Err(e) => {
                    warn!("Failed to extract {}: {e}", subpackage.display());
                    report.failures.push((subpackage, e));
                }
            }
        }

        if report.extracted.is_empty() {
            if let Err(e) = fs::remove_dir_all(dest) {
                warn!("Failed to remove {}: {e}", dest.display());
            }
        } else {
            info!(
                "Extracted {} of {} sub-packages from {}",
                report.success_count(),
                report.success_count() + report.failures.len(),
                metapackage.display()
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finds_files_and_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let packages = dir.path().join("Contents/Packages");
        fs::create_dir_all(packages.join("Bundle.pkg")).unwrap();
        fs::write(packages.join("Flat.pkg"), b"xar!").unwrap();
        fs::write(packages.join("notes.txt"), b"").unwrap();

        let found = find_subpackages(dir.path()).unwrap();
        assert_eq!(found, vec![packages.join("Bundle.pkg"), packages.join("Flat.pkg")]);
    }

    #[test]
    fn test_empty_metapackage_removes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let mpkg = dir.path().join("Suite.mpkg");
        fs::create_dir_all(mpkg.join("Contents/Resources")).unwrap();
        let dest = dir.path().join("Suite");

        let report = Extractor::default().process_metapackage(&mpkg, &dest).unwrap();
        assert_eq!(report.success_count(), 0);
        assert!(report.failures.is_empty());
        assert!(!dest.exists());
    }

    #[test]
    fn test_failed_subpackages_do_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let mpkg = dir.path().join("Suite.mpkg");
        let packages = mpkg.join("Contents/Packages");
        fs::create_dir_all(&packages).unwrap();
        fs::write(packages.join("A.pkg"), b"nope").unwrap();
        fs::write(packages.join("B.pkg"), b"nope").unwrap();
        let dest = dir.path().join("Suite");

        let report = Extractor::default().process_metapackage(&mpkg, &dest).unwrap();
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|(_, e)| matches!(e, Error::InvalidFormat { .. })));
        assert!(!dest.exists());
    }
}
