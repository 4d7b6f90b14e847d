//! kbuild_ci Rust backend
//!
//! This crate provides the helper toolkit for an Android kernel CI
//! pipeline: build-log error classification, artifact cleanup, and kernel
//! source/config patching for KernelSU, LXC/Docker, NetHunter and
//! Re:Kernel. It exposes a library API consumed by the `kbuild_ci` CLI.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Core data structures and types
//! - **logging**: Decoupled log collector wired into the `log` facade
//! - **settings**: Optional JSON tool settings
//! - **analyzer**: Build-log segmentation, classification and reporting
//! - **kconfig**: Kernel .config primitives and the requirements checker
//! - **features**: Per-feature patch drivers (KernelSU, LXC, NetHunter,
//!   Re:Kernel)
//! - **download**: HTTP fetch layer for patches and driver sources
//! - **clean**: Build artifact cleanup

// Core foundational modules
pub mod error;
pub mod models;

// Decoupled logging system
pub mod logging;

// Tool settings (JSON, optional)
pub mod settings;

// Build-log classifier
pub mod analyzer;

// Kernel .config inspection and rewriting
pub mod kconfig;

// Feature patch drivers
pub mod features;

// HTTP fetch layer
pub mod download;

// Artifact cleanup
pub mod clean;

// Re-export the log crate for macro usage
pub use log;

// Re-export error types for easy access
pub use error::{AnalyzeError, CleanError, ConfigError, DownloadError, PatchError, Result};

// Re-export model types for easy access
pub use models::{
    CheckMode, CheckOutcome, Classification, ErrorBlock, Report, ReportEntry, Requirements,
    Signature,
};

// Re-export the collector and settings for the binary
pub use logging::BuildLog;
pub use settings::Settings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_error_reexport() {
        let _: Result<i32> = Ok(42);
    }

    #[test]
    fn test_models_reexport() {
        let _mode = CheckMode::Check;
        let block = ErrorBlock::new("x.c:1:1: error: x".to_string());
        assert_eq!(block.lines.len(), 1);
    }
}
