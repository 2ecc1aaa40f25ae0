//! # unpkg
//!
//! Extract the contents of macOS installer packages without installing them.
//!
//! ## Supported Formats
//!
//! - **Legacy bundles** - `.pkg` directories carrying `Archive.pax` or `Archive.pax.gz`
//! - **Flat packages** - `.pkg` xar containers with one or more `Payload` entries
//! - **Metapackages** - `.mpkg` bundles; every sub-package is extracted
//!
//! Decoding is delegated to the system `xar`, `gzip`, `cpio` and `pax` programs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unpkg::prelude::*;
//!
//! let config = UnpkgConfig::default();
//! let package = Package::open("Tool.pkg")?;
//! let dest = resolve_extraction_dir(
//!     package.path(),
//!     &config.extraction.fallback_dir(),
//!     config.extraction.max_collision_suffix,
//! )?;
//!
//! let outcome = Extractor::from_config(&config).extract_package(&package, &dest)?;
//! println!("Extracted to {}", outcome.destination.display());
//! # Ok::<(), unpkg::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `unpkg` command-line binary (default)
//! - `dialog` - Modal message boxes for notifications

pub mod config;
pub mod driver;
pub mod error;
pub mod notify;
pub mod package;
pub mod tools;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::UnpkgConfig;
    pub use crate::driver::{ExtractionReport, RunSummary, run, run_with_progress};
    pub use crate::error::{Error, Result};
    pub use crate::notify::{ConsoleNotifier, Notifier};
    pub use crate::package::{
        ExtractionOutcome, Extractor, MetapackageReport, Package, PackageTarget,
        resolve_extraction_dir,
    };
    pub use crate::tools::{Tool, Toolchain};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
