//! Package format detection
//!
//! Installer packages come in two layouts:
//!
//! - **Legacy bundles** (10.4 and earlier): a directory tree holding an
//!   `Archive.pax` or `Archive.pax.gz` somewhere under `Contents/`.
//! - **Flat packages** (10.5 and later): a single xar container file whose
//!   expanded tree holds one or more `Payload` entries.
//!
//! Metapackages (`.mpkg`) bundle several `.pkg` sub-packages of either kind.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// xar container magic.
pub const XAR_MAGIC: [u8; 4] = *b"xar!";

/// Suffix marking a single package (and a sub-package inside a metapackage).
pub const PACKAGE_SUFFIX: &str = ".pkg";

/// Suffix marking a metapackage.
pub const METAPACKAGE_SUFFIX: &str = ".mpkg";

/// A package path, resolved once into its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    /// Directory bundle with a pax archive inside.
    Legacy(PathBuf),
    /// Flat xar container file.
    Container(PathBuf),
}

impl Package {
    /// Classify `path` by file system type: directories are legacy bundles,
    /// everything else is treated as a container.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the path cannot be inspected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        Ok(if metadata.is_dir() {
            Package::Legacy(path.to_path_buf())
        } else {
            Package::Container(path.to_path_buf())
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            Package::Legacy(path) | Package::Container(path) => path,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Package::Legacy(_))
    }
}

/// What a command-line argument asks `unpkg` to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageTarget {
    /// Extract every sub-package of a metapackage.
    Metapackage(PathBuf),
    /// Extract one package.
    Single(PathBuf),
}

impl PackageTarget {
    /// Metapackages are recognised by their `.mpkg` suffix alone.
    pub fn classify(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if is_metapackage(path) {
            PackageTarget::Metapackage(path.to_path_buf())
        } else {
            PackageTarget::Single(path.to_path_buf())
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PackageTarget::Metapackage(path) | PackageTarget::Single(path) => path,
        }
    }
}

/// True if `path` names a metapackage.
pub fn is_metapackage(path: &Path) -> bool {
    path.to_string_lossy()
        .trim_end_matches('/')
        .ends_with(METAPACKAGE_SUFFIX)
}

/// True if `data` starts with the xar magic.
pub fn has_xar_magic(data: &[u8]) -> bool {
    data.starts_with(&XAR_MAGIC)
}

/// Read the first four bytes of `path` and compare them with [`XAR_MAGIC`].
///
/// Files shorter than four bytes are not containers.
pub fn is_xar_container(path: &Path) -> Result<bool> {
    let mut header = Vec::with_capacity(XAR_MAGIC.len());
    File::open(path)?
        .take(XAR_MAGIC.len() as u64)
        .read_to_end(&mut header)?;
    Ok(has_xar_magic(&header))
}

/// Fail with [`Error::InvalidFormat`] unless `path` is a xar container.
pub fn ensure_xar_container(path: &Path) -> Result<()> {
    if is_xar_container(path)? {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            path: path.to_path_buf(),
        })
    }
}
