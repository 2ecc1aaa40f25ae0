//! Installer package handling
//!
//! Format detection, destination selection and extraction of single packages
//! and metapackages.

pub mod destination;
pub mod detect;
pub mod extractor;
pub mod metapackage;
pub mod payload;

pub use destination::{package_stem, resolve_extraction_dir};
pub use detect::{Package, PackageTarget, XAR_MAGIC, is_metapackage};
pub use extractor::{ExtractionOutcome, Extractor};
pub use metapackage::{MetapackageReport, find_subpackages};
pub use payload::{LegacyArchive, find_legacy_archive, find_payloads};
