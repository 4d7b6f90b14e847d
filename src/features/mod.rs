//! Feature patch drivers: KernelSU, LXC/Docker, NetHunter, Re:Kernel.
//!
//! Each submodule owns one feature's config requirement lists and/or source
//! patches. Shared here: the Coccinelle runner and the external-tool probe
//! everything else leans on.

pub mod kernelsu;
pub mod lxc;
pub mod nethunter;
pub mod rekernel;

use crate::error::PatchError;
use std::path::Path;
use std::process::Command;

/// Check that an external tool is on PATH.
pub fn require_tool(name: &str) -> Result<(), PatchError> {
    let found = Command::new("which")
        .arg(name)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if found {
        Ok(())
    } else {
        Err(PatchError::MissingDependency(name.to_string()))
    }
}

/// Apply a Coccinelle semantic patch to a single file.
///
/// With `tolerant` set, a failing spatch run is logged and swallowed; the
/// upstream patch sets are applied best-effort across wildly different
/// kernel trees.
pub fn apply_spatch(
    cocci_file: &Path,
    target_file: &Path,
    extra_args: &[&str],
    tolerant: bool,
) -> Result<(), PatchError> {
    if !target_file.exists() {
        return Err(PatchError::FileNotFound(target_file.display().to_string()));
    }

    log::info!(
        "Applying {} to {}",
        cocci_file.display(),
        target_file.display()
    );

    let mut cmd = Command::new("spatch");
    cmd.args(extra_args)
        .arg("--sp-file")
        .arg(cocci_file)
        .arg(target_file);

    let output = cmd
        .output()
        .map_err(|e| PatchError::PatchFailed(format!("Failed to run spatch: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = format!(
            "spatch failed on {}: {}",
            target_file.display(),
            stderr.trim()
        );
        if tolerant {
            log::warn!("{}", message);
            return Ok(());
        }
        return Err(PatchError::PatchFailed(message));
    }

    Ok(())
}
