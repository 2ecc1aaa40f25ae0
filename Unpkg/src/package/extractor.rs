//! Single-package extraction

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_MAX_COLLISION_SUFFIX, UnpkgConfig};
use crate::error::{Error, Result};
use crate::tools::{Pipeline, Tool, Toolchain};

use super::destination::unique_child;
use super::detect::{Package, ensure_xar_container};
use super::payload::{LegacyArchive, component_name, find_legacy_archive, find_payloads, is_gzip};

/// What a successful extraction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// The populated destination directory.
    pub destination: PathBuf,
    /// Per-payload subdirectories for multi-component packages; empty otherwise.
    pub components: Vec<PathBuf>,
}

/// Drives the external tools that unpack packages.
#[derive(Debug, Clone)]
pub struct Extractor {
    tools: Toolchain,
    workspace_root: Option<PathBuf>,
    /// Bound for `-N` suffixes on sub-package and component folders.
    max_collision_suffix: u32,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Toolchain::default())
    }
}

impl Extractor {
    pub fn new(tools: Toolchain) -> Self {
        Self {
            tools,
            workspace_root: None,
            max_collision_suffix: DEFAULT_MAX_COLLISION_SUFFIX,
        }
    }

    pub fn from_config(config: &UnpkgConfig) -> Self {
        Self {
            tools: Toolchain::from_config(&config.tools),
            workspace_root: config.extraction.workspace_root(),
            max_collision_suffix: config.extraction.max_collision_suffix,
        }
    }

    /// Create container workspaces under `root` instead of the system temp dir.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_max_collision_suffix(mut self, max_suffix: u32) -> Self {
        self.max_collision_suffix = max_suffix;
        self
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.tools
    }

    /// Free folder named `name` under `parent`, suffixed `-N` when taken.
    pub(super) fn unique_folder(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        unique_child(parent, name, self.max_collision_suffix).ok_or_else(|| {
            Error::ResourceExhausted {
                path: parent.join(name),
                limit: self.max_collision_suffix,
            }
        })
    }

    /// Extract `package` into `dest`.
    ///
    /// `dest` is created only once a payload has been located, so a package
    /// that turns out to be invalid leaves nothing behind. If unpacking fails
    /// after this call created `dest`, it is removed again.
    ///
    /// # Errors
    /// - [`Error::PayloadNotFound`] if a legacy bundle has no pax archive or a
    ///   container has no `Payload` entry
    /// - [`Error::InvalidFormat`] if a container file lacks the xar magic
    /// - [`Error::ToolNotFound`], [`Error::Spawn`] or [`Error::CommandFailed`]
    ///   when an external program cannot do its part
    pub fn extract_package(&self, package: &Package, dest: &Path) -> Result<ExtractionOutcome> {
        match package {
            Package::Legacy(bundle) => self.extract_legacy(bundle, dest),
            Package::Container(file) => self.extract_container(file, dest),
        }
    }

    fn extract_legacy(&self, bundle: &Path, dest: &Path) -> Result<ExtractionOutcome> {
        let archive = find_legacy_archive(bundle)?;
        let pipeline = self.legacy_pipeline(&archive)?;

        fill_destination(dest, || {
            fs::create_dir_all(dest)?;
            pipeline.run(dest)
        })?;

        info!("Extracted {} to {}", bundle.display(), dest.display());
        Ok(ExtractionOutcome {
            destination: dest.to_path_buf(),
            components: Vec::new(),
        })
    }

    fn extract_container(&self, file: &Path, dest: &Path) -> Result<ExtractionOutcome> {
        ensure_xar_container(file)?;
        let file = file.canonicalize()?;
        let xar = self.tools.invocation(Tool::Xar)?.arg(&file);

        let workspace = self.create_workspace()?;
        debug!("workspace: {}", workspace.path().display());
        xar.run_in(workspace.path())?;

        let payloads = find_payloads(workspace.path())?;
        let outcome = match payloads.as_slice() {
            [] => Err(Error::PayloadNotFound {
                path: file.clone(),
                expected: "a Payload entry",
            }),
            [payload] => fill_destination(dest, || self.unpack_payload(payload, dest)).map(|()| {
                ExtractionOutcome {
                    destination: dest.to_path_buf(),
                    components: Vec::new(),
                }
            }),
            _ => fill_destination(dest, || self.unpack_components(&payloads, dest)),
        };

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace {}: {e}", workspace_path.display());
        }

        let outcome = outcome?;
        info!(
            "Extracted {} ({} payloads) to {}",
            file.display(),
            payloads.len(),
            dest.display()
        );
        Ok(outcome)
    }

    fn unpack_components(&self, payloads: &[PathBuf], dest: &Path) -> Result<ExtractionOutcome> {
        let mut components = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let component = self.unique_folder(dest, &component_name(payload))?;
            self.unpack_payload(payload, &component)?;
            components.push(component);
        }
        Ok(ExtractionOutcome {
            destination: dest.to_path_buf(),
            components,
        })
    }

    fn unpack_payload(&self, payload: &Path, dest: &Path) -> Result<()> {
        let pipeline = self.payload_pipeline(payload)?;
        fs::create_dir_all(dest)?;
        pipeline.run(dest)
    }

    fn create_workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("unpkg-");
        let workspace = match &self.workspace_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(workspace)
    }

    /// `gzip -dc | pax -r` for `.pax.gz`, plain `pax -r` otherwise.
    pub fn legacy_pipeline(&self, archive: &LegacyArchive) -> Result<Pipeline> {
        let pipeline = Pipeline::new(&archive.path, self.tools.invocation(Tool::Pax)?);
        if archive.compressed {
            Ok(pipeline.with_decompression(self.tools.invocation(Tool::Gzip)?))
        } else {
            Ok(pipeline)
        }
    }

    /// `gzip -dc | cpio -i` for gzip payloads, plain `cpio -i` otherwise.
    pub fn payload_pipeline(&self, payload: &Path) -> Result<Pipeline> {
        let pipeline = Pipeline::new(payload, self.tools.invocation(Tool::Cpio)?);
        if is_gzip(payload)? {
            Ok(pipeline.with_decompression(self.tools.invocation(Tool::Gzip)?))
        } else {
            Ok(pipeline)
        }
    }
}

/// Run `fill`, removing `dest` again if it fails and `dest` did not exist beforehand.
fn fill_destination<T>(dest: &Path, fill: impl FnOnce() -> Result<T>) -> Result<T> {
    let created = !dest.exists();
    let result = fill();
    if result.is_err() && created && dest.exists() {
        debug!("removing partial extraction {}", dest.display());
        if let Err(e) = fs::remove_dir_all(dest) {
            warn!("Failed to remove {}: {e}", dest.display());
        }
    }
    result
}
