//! Error types for `unpkg`

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// The error type for `unpkg` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Package Errors ====================
    /// The package path cannot be read by the current user.
    #[error("cannot read package \"{}\"", .path.display())]
    PermissionDenied {
        /// The unreadable package path.
        path: PathBuf,
    },

    /// The package holds nothing that can be unpacked.
    #[error("cannot find {expected} in \"{}\" (not a valid package?)", .path.display())]
    PayloadNotFound {
        /// The package that was searched.
        path: PathBuf,
        /// What was searched for (a pax archive or a `Payload` entry).
        expected: &'static str,
    },

    /// The file does not start with the xar container magic.
    #[error("\"{}\" is not a valid package", .path.display())]
    InvalidFormat {
        /// The offending package file.
        path: PathBuf,
    },

    /// Every candidate name for the extraction directory is taken.
    #[error("cannot establish an extraction directory for \"{}\" ({limit} suffixes tried)", .path.display())]
    ResourceExhausted {
        /// The package that needed a destination.
        path: PathBuf,
        /// The highest numeric suffix that was tried.
        limit: u32,
    },

    // ==================== External Tool Errors ====================
    /// A required external program could not be located.
    #[error("{tool} not found: {source}")]
    ToolNotFound {
        /// The configured program name or path.
        tool: String,
        /// The lookup failure.
        source: which::Error,
    },

    /// An external program could not be started.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// An external program exited unsuccessfully.
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        /// The program that failed.
        program: String,
        /// Its exit status.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    // ==================== Configuration Errors ====================
    /// The configuration file could not be parsed.
    #[error("invalid config {}: {message}", .path.display())]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// The parser message.
        message: String,
    },

    // ==================== File System Errors ====================
    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `unpkg` operations.
pub type Result<T> = std::result::Result<T, Error>;
