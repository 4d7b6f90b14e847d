//! KernelSU Coccinelle patch application.
//!
//! The KernelSU hook patches ship as a single semantic patch whose rules
//! name their target files inline (`file in "fs/exec.c"` etc.). The driver
//! downloads the patch, pulls the target list out of it, and spatches each
//! file in place, best-effort.

use crate::download;
use crate::error::PatchError;
use crate::features::{apply_spatch, require_tool};
use crate::settings::Settings;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Default semantic patch applied when none is named.
pub const DEFAULT_PATCH: &str = "minimal.cocci";

// Rule headers like: file in "drivers/input/input.c"
static FILE_TARGET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"file in "([^"]+)""#).expect("Invalid file target regex"));

/// Extract the target file paths named by a cocci patch, deduplicated in
/// first-seen order.
pub fn extract_targets(cocci_content: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in FILE_TARGET_REGEX.captures_iter(cocci_content) {
        let target = caps[1].to_string();
        if !seen.contains(&target) {
            seen.push(target);
        }
    }
    seen
}

/// Download the named KernelSU patch and apply it to every file it targets.
///
/// Individual spatch failures are logged and skipped; a kernel tree that
/// predates one of the hooks still gets the rest.
pub async fn apply(
    kernel_dir: &Path,
    settings: &Settings,
    patch_name: &str,
) -> crate::error::Result<()> {
    require_tool("spatch")?;

    let temp_dir = tempfile::tempdir()?;
    let cocci_file = temp_dir.path().join(patch_name);
    let url = format!("{}/kernelsu/{}", settings.mirror_base, patch_name);
    download::fetch(&url, &cocci_file).await?;

    let content = fs::read_to_string(&cocci_file).map_err(PatchError::IoError)?;
    let targets = extract_targets(&content);
    if targets.is_empty() {
        return Err(Box::new(PatchError::PatchFailed(format!(
            "{} names no target files",
            patch_name
        ))));
    }

    for target in &targets {
        let target_path = kernel_dir.join(target);
        if !target_path.exists() {
            log::warn!("{} not found, skipping", target_path.display());
            continue;
        }
        apply_spatch(
            &cocci_file,
            &target_path,
            &["--very-quiet", "--in-place", "--linux-spacing"],
            true,
        )?;
        println!("Applied patch to {}", target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_targets_in_order() {
        let cocci = r#"
@r1@
@@
file in "fs/exec.c"

@r2@
@@
file in "fs/open.c"
"#;
        assert_eq!(extract_targets(cocci), vec!["fs/exec.c", "fs/open.c"]);
    }

    #[test]
    fn test_extract_targets_dedups_first_seen() {
        let cocci = r#"
file in "fs/exec.c"
file in "fs/open.c"
file in "fs/exec.c"
"#;
        assert_eq!(extract_targets(cocci), vec!["fs/exec.c", "fs/open.c"]);
    }

    #[test]
    fn test_extract_targets_empty() {
        assert!(extract_targets("@@ rule without targets @@").is_empty());
    }
}
