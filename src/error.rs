//! Unified error type hierarchy for kbuild_ci
//!
//! Provides structured error handling with AnalyzeError, ConfigError,
//! PatchError, DownloadError, and CleanError.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Build-log analysis errors.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Log file '{0}' does not exist")]
    LogNotFound(PathBuf),

    #[error("Failed to read log file '{path}': {source}")]
    LogUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create error marker: {0}")]
    MarkerFailed(io::Error),

    #[error("I/O error during analysis: {0}")]
    Io(#[from] io::Error),
}

/// Kernel .config inspection and rewrite errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Config file must be within the current directory: {0}")]
    OutsideWorkingDirectory(String),

    #[error("Invalid JSON in settings: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Kernel source patching errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Patch target file not found: {0}")]
    FileNotFound(String),

    #[error("Missing required tool: {0}")]
    MissingDependency(String),

    #[error("Patch application failed: {0}")]
    PatchFailed(String),

    #[error("IO error during patching: {0}")]
    IoError(#[from] io::Error),
}

/// Patch/source download errors.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Server returned {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to write downloaded file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Build artifact cleanup errors.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Failed to remove {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot determine home directory")]
    NoHomeDirectory,
}

/// Top-level result type for operations that may fail.
/// Use this as the return type for the binary's fallible entry points.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
