//! Processing a list of package paths
//!
//! Paths are handled one at a time, in order. A failure ends work on that
//! path only; every path gets exactly one notification (plus one per failed
//! sub-package of a metapackage).

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::UnpkgConfig;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::package::{Extractor, Package, PackageTarget, resolve_extraction_dir};

/// Called before each path with `(index, total, path)`; `index` is zero-based.
pub type ProgressCallback<'a> = &'a dyn Fn(usize, usize, &Path);

/// Outcome for one command-line path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub package: PathBuf,
    /// Directory that now holds the extracted files.
    pub destination: Option<PathBuf>,
    /// Sub-packages extracted, for metapackages.
    pub subpackages: Option<usize>,
    pub error: Option<String>,
    /// The text shown to the user.
    pub message: String,
}

impl ExtractionReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    fn extracted(package: &Path, destination: &Path) -> Self {
        Self {
            package: package.to_path_buf(),
            destination: Some(destination.to_path_buf()),
            subpackages: None,
            error: None,
            message: format!(
                "Extracted \"{}\" to \"{}\".",
                display_name(package),
                destination.display()
            ),
        }
    }

    fn failed(package: &Path, error: &Error) -> Self {
        let message = match error {
            Error::PermissionDenied { .. } => {
                format!("Cannot read package \"{}\".", display_name(package))
            }
            other => format!("Could not extract \"{}\": {other}", display_name(package)),
        };
        Self {
            package: package.to_path_buf(),
            destination: None,
            subpackages: None,
            error: Some(error.to_string()),
            message,
        }
    }
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<ExtractionReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }
}

/// Extract every path in `paths`, notifying after each one.
pub fn run(paths: &[PathBuf], config: &UnpkgConfig, notifier: &dyn Notifier) -> RunSummary {
    run_with_progress(paths, config, notifier, &|_, _, _| {})
}

/// [`run`] with a callback invoked before each path starts.
pub fn run_with_progress(
    paths: &[PathBuf],
    config: &UnpkgConfig,
    notifier: &dyn Notifier,
    progress: ProgressCallback,
) -> RunSummary {
    let extractor = Extractor::from_config(config);
    let paths = dedup_paths(paths);
    let total = paths.len();
    let mut summary = RunSummary::default();

    for (index, path) in paths.iter().enumerate() {
        progress(index, total, path);
        let report = process_path(&extractor, config, path, notifier);
        if report.success() {
            info!("{}", report.message);
        } else {
            error!("{}", report.message);
        }
        notifier.notify(&report.message);
        summary.reports.push(report);
    }

    summary
}

fn process_path(
    extractor: &Extractor,
    config: &UnpkgConfig,
    path: &Path,
    notifier: &dyn Notifier,
) -> ExtractionReport {
    if let Err(e) = check_readable(path) {
        return ExtractionReport::failed(path, &e);
    }

    let dest = match resolve_extraction_dir(
        path,
        &config.extraction.fallback_dir(),
        config.extraction.max_collision_suffix,
    ) {
        Ok(dest) => dest,
        Err(e) => return ExtractionReport::failed(path, &e),
    };
    debug!("{} -> {}", path.display(), dest.display());

    match PackageTarget::classify(path) {
        PackageTarget::Metapackage(path) => process_metapackage(extractor, &path, &dest, notifier),
        PackageTarget::Single(path) => match Package::open(&path)
            .and_then(|package| extractor.extract_package(&package, &dest))
        {
            Ok(outcome) => ExtractionReport::extracted(&path, &outcome.destination),
            Err(e) => ExtractionReport::failed(&path, &e),
        },
    }
}

fn process_metapackage(
    extractor: &Extractor,
    path: &Path,
    dest: &Path,
    notifier: &dyn Notifier,
) -> ExtractionReport {
    let report = match extractor.process_metapackage(path, dest) {
        Ok(report) => report,
        Err(e) => return ExtractionReport::failed(path, &e),
    };

    for (subpackage, e) in &report.failures {
        notifier.notify(&format!(
            "Could not extract \"{}\": {e}",
            display_name(subpackage)
        ));
    }

    let name = display_name(path);
    let count = report.success_count();
    if count > 0 {
        return ExtractionReport {
            package: path.to_path_buf(),
            destination: Some(report.destination.clone()),
            subpackages: Some(count),
            error: None,
            message: format!(
                "Extracted {count} internal packages from \"{name}\" to \"{}\".",
                report.destination.display()
            ),
        };
    }

    let message = if report.failures.is_empty() {
        format!("No packages found within the \"{name}\" metapackage.")
    } else {
        format!(
            "None of the {} packages within the \"{name}\" metapackage could be extracted.",
            report.failures.len()
        )
    };
    ExtractionReport {
        package: path.to_path_buf(),
        destination: None,
        subpackages: Some(0),
        error: Some(message.clone()),
        message,
    }
}

/// Fail with [`Error::PermissionDenied`] unless `path` can be opened for reading.
pub fn check_readable(path: &Path) -> Result<()> {
    let readable = match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path).map(drop),
        Ok(_) => File::open(path).map(drop),
        Err(e) => Err(e),
    };
    readable.map_err(|e| {
        debug!("{} is not readable: {e}", path.display());
        Error::PermissionDenied {
            path: path.to_path_buf(),
        }
    })
}

/// Drop repeated paths, keeping the first occurrence.
fn dedup_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|p| seen.insert(p.as_path()))
        .cloned()
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Notifier for Recorder {
        fn notify(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let paths = vec![
            PathBuf::from("/a/One.pkg"),
            PathBuf::from("/a/Two.pkg"),
            PathBuf::from("/a/One.pkg"),
        ];
        assert_eq!(
            dedup_paths(&paths),
            vec![PathBuf::from("/a/One.pkg"), PathBuf::from("/a/Two.pkg")]
        );
    }

    #[test]
    fn test_missing_path_is_unreadable() {
        let err = check_readable(Path::new("/nonexistent/Tool.pkg")).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_unreadable_path_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("Bogus.pkg");
        fs::write(&bogus, b"not a package").unwrap();
        let paths = vec![PathBuf::from("/nonexistent/Tool.pkg"), bogus];

        let recorder = Recorder::default();
        let summary = run(&paths, &UnpkgConfig::default(), &recorder);

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.failed(), 2);
        let messages = recorder.0.borrow();
        assert_eq!(messages[0], "Cannot read package \"Tool.pkg\".");
        assert!(messages[1].starts_with("Could not extract \"Bogus.pkg\""));
        assert!(!dir.path().join("Bogus").exists());
    }

    #[test]
    fn test_empty_metapackage_message() {
        let dir = tempfile::tempdir().unwrap();
        let mpkg = dir.path().join("Suite.mpkg");
        fs::create_dir_all(mpkg.join("Contents")).unwrap();

        let recorder = Recorder::default();
        let summary = run(&[mpkg], &UnpkgConfig::default(), &recorder);

        assert_eq!(summary.succeeded(), 0);
        assert_eq!(
            recorder.0.borrow().as_slice(),
            &["No packages found within the \"Suite.mpkg\" metapackage.".to_string()]
        );
        assert!(!dir.path().join("Suite").exists());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_each_message_is_logged_once() {
        use crate::notify::ConsoleNotifier;
        use std::io::{self, Write};
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            run(
                &[PathBuf::from("/nonexistent/Tool.pkg")],
                &UnpkgConfig::default(),
                &ConsoleNotifier::new("unpkg"),
            )
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("Cannot read package").count(), 1);
    }

    #[test]
    fn test_progress_sees_every_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("a.pkg"), dir.path().join("b.pkg")];
        let seen = RefCell::new(Vec::new());

        run_with_progress(
            &paths,
            &UnpkgConfig::default(),
            &Recorder::default(),
            &|index, total, _| seen.borrow_mut().push((index, total)),
        );

        assert_eq!(*seen.borrow(), vec![(0, 2), (1, 2)]);
    }
}
