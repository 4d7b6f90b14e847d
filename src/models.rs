//! Core data types for kbuild_ci.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One detected error incident: the trigger line plus its continuation lines.
///
/// Invariant: `lines` is never empty; a block always contains at least the
/// line that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBlock {
    /// Raw log lines, trailing newlines stripped, original order preserved.
    pub lines: Vec<String>,
}

impl ErrorBlock {
    pub fn new(trigger: String) -> Self {
        ErrorBlock {
            lines: vec![trigger],
        }
    }

    /// The block's lines joined with newlines, as scanned by the catalog.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// One known failure signature: a pattern with its category and advice.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Case-insensitive regex searched anywhere in the block text.
    pub pattern: &'static str,
    /// Short category label, e.g. "Link Error: Missing Library or Function".
    pub category: &'static str,
    /// Human-readable remediation advice.
    pub suggestion: &'static str,
}

/// The outcome of classifying one error block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub suggestion: String,
}

/// A classified block, as rendered in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub block: ErrorBlock,
    pub classification: Classification,
}

/// Full analysis result for one log file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    /// Total trigger-line count. May exceed `entries.len()` when consecutive
    /// trigger lines fold into one block.
    pub error_count: usize,
}

/// Whether a config checker only reports problems or also fixes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Report problems, change nothing.
    Check,
    /// Rewrite the config file to satisfy the requirements.
    Write,
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMode::Check => write!(f, "check"),
            CheckMode::Write => write!(f, "write"),
        }
    }
}

/// Tally of a config requirements run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Problems found and left in place.
    pub errors: usize,
    /// Problems corrected (write mode only).
    pub fixes: usize,
}

impl CheckOutcome {
    pub fn clean(&self) -> bool {
        self.errors == 0
    }
}

/// A feature's kernel config requirements, consumed by the kconfig checker.
#[derive(Debug, Clone, Copy)]
pub struct Requirements {
    /// Symbols that must be enabled (=y, =m accepted as already-on).
    pub enable: &'static [&'static str],
    /// Symbols that must be disabled.
    pub disable: &'static [&'static str],
    /// Exact `NAME=value` assignments that must hold verbatim.
    pub exact: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_block_text_joins_lines() {
        let mut block = ErrorBlock::new("foo.c:1:1: error: bad".to_string());
        block.lines.push("note: declared here".to_string());
        assert_eq!(block.text(), "foo.c:1:1: error: bad\nnote: declared here");
    }

    #[test]
    fn test_check_outcome_clean() {
        assert!(CheckOutcome::default().clean());
        let dirty = CheckOutcome {
            errors: 2,
            fixes: 0,
        };
        assert!(!dirty.clean());
    }

    #[test]
    fn test_check_mode_display() {
        assert_eq!(CheckMode::Check.to_string(), "check");
        assert_eq!(CheckMode::Write.to_string(), "write");
    }
}
