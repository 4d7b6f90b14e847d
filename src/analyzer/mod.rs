//! Build-log analysis: segmentation, classification, reporting.
//!
//! Reads a compiler/linker log, groups it into error blocks, classifies each
//! block against the signature catalog, prints the report, and drops the
//! `have_error` marker for downstream CI gating when anything was found.

pub mod catalog;
pub mod segment;

use crate::error::AnalyzeError;
use crate::models::{Report, ReportEntry};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Sentinel file touched in the working directory when errors are found.
/// Its presence is the machine-checkable "build failed" signal; it is never
/// removed or pre-checked here.
pub const MARKER_FILE: &str = "have_error";

const SEPARATOR_WIDTH: usize = 56;

/// Analyze a build log file into a classified report.
///
/// Decoding is permissive: invalid byte sequences are replaced rather than
/// failing the run. A missing or unreadable file is the only fatal case.
pub fn analyze_log(path: &Path) -> Result<Report, AnalyzeError> {
    if !path.exists() {
        return Err(AnalyzeError::LogNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| AnalyzeError::LogUnreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let content = String::from_utf8_lossy(&bytes);

    let segmentation = segment::segment_lines(content.lines());

    let entries = segmentation
        .blocks
        .into_iter()
        .map(|block| {
            let classification = catalog::classify(&block);
            ReportEntry {
                block,
                classification,
            }
        })
        .collect();

    Ok(Report {
        entries,
        error_count: segmentation.trigger_count,
    })
}

/// Render the full report.
///
/// The format is line-oriented and stable enough for CI log capture:
/// `Error #N` headers, per-block category/suggestion, and a banner-bounded
/// summary with the `Total: N error(s)` line CI greps for.
pub fn render_report<W: Write>(log_file: &Path, report: &Report, out: &mut W) -> io::Result<()> {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let banner = "=".repeat(SEPARATOR_WIDTH);

    writeln!(out, "Analyzing log file: {}", log_file.display())?;
    writeln!(out, "{}", separator)?;

    for (idx, entry) in report.entries.iter().enumerate() {
        writeln!(out, "Error #{}:", idx + 1)?;
        for line in &entry.block.lines {
            writeln!(out, "  {}", line)?;
        }
        writeln!(out, "Error: {}", entry.classification.category)?;
        writeln!(out, "Suggestion: {}", entry.classification.suggestion)?;
        writeln!(out, "{}", separator)?;
    }

    if report.error_count > 0 {
        writeln!(out, "Total found {} error(s).", report.error_count)?;
        writeln!(
            out,
            "Please carefully review the error messages and suggestions above."
        )?;
    } else {
        writeln!(out, "No errors found.")?;
    }
    writeln!(out, "{}", separator)?;

    // Aggregated summary at the bottom for CI visibility.
    if report.error_count > 0 {
        writeln!(out)?;
        writeln!(out)?;
        writeln!(out, "{}", banner)?;
        writeln!(out, "                    Error Summary")?;
        writeln!(out, "{}", banner)?;
        for (idx, entry) in report.entries.iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "  [{}] {}", idx + 1, entry.classification.category)?;
            writeln!(out, "      Suggestion: {}", entry.classification.suggestion)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", banner)?;
        writeln!(out, "Total: {} error(s)", report.error_count)?;
        writeln!(out, "{}", banner)?;
    }

    Ok(())
}

/// Touch the error marker in `dir`. Repeated runs simply re-touch it.
pub fn touch_marker(dir: &Path) -> Result<(), AnalyzeError> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(MARKER_FILE))
        .map_err(AnalyzeError::MarkerFailed)?;
    Ok(())
}

/// Full analysis run: read, classify, print to stdout, drop the marker.
///
/// Returns the total error count for the caller's exit signalling. Nothing
/// is printed before the input is known to be readable, so a failed run
/// never emits a partial report.
pub fn run(log_file: &Path) -> Result<usize, AnalyzeError> {
    let report = analyze_log(log_file)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_report(log_file, &report, &mut out)?;

    if report.error_count > 0 {
        let cwd = std::env::current_dir()?;
        touch_marker(&cwd)?;
        log::info!(
            "Classified {} error(s) in {}, marker created",
            report.error_count,
            log_file.display()
        );
    } else {
        log::info!("No errors found in {}", log_file.display());
    }

    Ok(report.error_count)
}
