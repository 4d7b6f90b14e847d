//! Re:Kernel driver installation.
//!
//! Downloads the Re:Kernel driver source and its Coccinelle patch set,
//! drops the driver into `drivers/rekernel`, patches binder and signal
//! delivery, and wires the driver into the tree's defconfig, Kconfig and
//! Makefile. Every wiring step is idempotent: files that already mention
//! rekernel are left alone.

use crate::download;
use crate::error::PatchError;
use crate::features::{apply_spatch, require_tool};
use crate::settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

// The binder patch only fits trees carrying this upstream doc comment on
// binder_proc_transaction; anything else has diverged too far.
const BINDER_MARKER: &str =
    "binder_proc_transaction() - sends a transaction to a process and wakes it up";

/// Does this tree use `struct proc_ops` (5.6+) instead of file_operations?
pub fn has_proc_ops(kernel_dir: &Path) -> bool {
    let proc_fs = kernel_dir.join("include/linux/proc_fs.h");
    match fs::read_to_string(proc_fs) {
        Ok(content) => content.contains("struct proc_ops"),
        Err(_) => false,
    }
}

/// Does the binder source still match the shape the patch expects?
pub fn binder_patchable(binder_file: &Path) -> bool {
    match fs::read_to_string(binder_file) {
        Ok(content) => content.contains(BINDER_MARKER),
        Err(_) => false,
    }
}

/// Does a build file already mention Re:Kernel (case-insensitive)?
pub fn mentions_rekernel(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(content) => content.to_lowercase().contains("rekernel"),
        Err(_) => false,
    }
}

/// Append the Re:Kernel defconfig options.
pub fn wire_defconfig(defconfig: &Path) -> Result<(), PatchError> {
    let mut content = fs::read_to_string(defconfig)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str("\nCONFIG_REKERNEL=y\nCONFIG_REKERNEL_NETWORK=n\n");
    fs::write(defconfig, content)?;
    Ok(())
}

/// Insert the Kconfig source line before the last `endmenu`.
///
/// Appends at the end when the file has no `endmenu` at all. Returns the
/// content unchanged if the source line is already present.
pub fn insert_kconfig_source(content: &str) -> String {
    const SOURCE_LINE: &str = "source \"drivers/rekernel/Kconfig\"";

    if content.contains(SOURCE_LINE) {
        return content.to_string();
    }

    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    let last_endmenu = lines
        .iter()
        .rposition(|line| line.trim() == "endmenu");

    match last_endmenu {
        Some(pos) => lines.insert(pos, SOURCE_LINE.to_string()),
        None => lines.push(SOURCE_LINE.to_string()),
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Wire `drivers/Kconfig` to include the Re:Kernel Kconfig.
pub fn wire_kconfig(kconfig: &Path) -> Result<(), PatchError> {
    let content = fs::read_to_string(kconfig)?;
    fs::write(kconfig, insert_kconfig_source(&content))?;
    Ok(())
}

/// Wire `drivers/Makefile` to build the driver.
pub fn wire_makefile(makefile: &Path) -> Result<(), PatchError> {
    const OBJ_LINE: &str = "obj-$(CONFIG_REKERNEL) += rekernel/";
    let mut content = fs::read_to_string(makefile)?;
    if content.contains(OBJ_LINE) {
        return Ok(());
    }
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str("\nobj-$(CONFIG_REKERNEL) += rekernel/\n");
    fs::write(makefile, content)?;
    Ok(())
}

/// Move a directory, falling back to copy+remove across filesystems.
fn move_dir(src: &Path, dst: &Path) -> Result<(), PatchError> {
    if dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    copy_dir(src, dst)?;
    fs::remove_dir_all(src)?;
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<(), PatchError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn unzip(archive: &Path, dest: &Path) -> Result<(), PatchError> {
    let output = Command::new("unzip")
        .arg("-o")
        .arg(archive)
        .arg("-d")
        .arg(dest)
        .output()
        .map_err(|e| PatchError::PatchFailed(format!("Failed to run unzip: {}", e)))?;
    if !output.status.success() {
        return Err(PatchError::PatchFailed(format!(
            "unzip failed on {}: {}",
            archive.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Download, install and wire the Re:Kernel driver into a kernel tree.
pub async fn install(kernel_dir: &Path, settings: &Settings) -> crate::error::Result<()> {
    require_tool("spatch")?;
    require_tool("unzip")?;

    let temp_dir = tempfile::tempdir()?;
    let cocci_dir = temp_dir.path().join("cocci");
    fs::create_dir_all(&cocci_dir).map_err(PatchError::IoError)?;

    println!("Downloading Re:Kernel source and patches...");
    let src_zip = temp_dir.path().join("src.zip");
    let jobs: Vec<(String, PathBuf)> = vec![
        (
            format!("{}/rekernel/src.zip", settings.mirror_base),
            src_zip.clone(),
        ),
        (
            format!("{}/proc_ops.cocci", settings.patches_base),
            cocci_dir.join("proc_ops.cocci"),
        ),
        (
            format!("{}/binder.cocci", settings.patches_base),
            cocci_dir.join("binder.cocci"),
        ),
        (
            format!("{}/signal.cocci", settings.patches_base),
            cocci_dir.join("signal.cocci"),
        ),
    ];
    download::fetch_all(&jobs).await?;

    println!("Extracting source...");
    unzip(&src_zip, temp_dir.path())?;

    let rekernel_src = temp_dir.path().join("rekernel");
    if !rekernel_src.exists() {
        return Err(Box::new(PatchError::PatchFailed(
            "src.zip did not contain a rekernel directory".to_string(),
        )));
    }
    let rekernel_dst = kernel_dir.join("drivers/rekernel");
    move_dir(&rekernel_src, &rekernel_dst)?;
    println!("Moved rekernel to {}", rekernel_dst.display());

    // Newer trees expose proc entries through proc_ops; rewrite the driver
    // before it ever gets compiled against one.
    let rekernel_c = rekernel_dst.join("rekernel.c");
    if has_proc_ops(kernel_dir) {
        if rekernel_c.exists() {
            apply_spatch(&cocci_dir.join("proc_ops.cocci"), &rekernel_c, &["--in-place"], true)?;
        } else {
            log::warn!("{} not found, skipping", rekernel_c.display());
        }
    }

    let binder_file = kernel_dir.join("drivers/android/binder.c");
    if !binder_file.exists() {
        log::warn!("{} not found, skipping", binder_file.display());
    } else if !binder_patchable(&binder_file) {
        log::error!(
            "Could not find 'binder_proc_transaction()' in '{}'",
            binder_file.display()
        );
    } else {
        apply_spatch(&cocci_dir.join("binder.cocci"), &binder_file, &["--in-place"], true)?;
    }

    let signal_file = kernel_dir.join("kernel/signal.c");
    if signal_file.exists() {
        apply_spatch(&cocci_dir.join("signal.cocci"), &signal_file, &["--in-place"], true)?;
    } else {
        log::warn!("{} not found, skipping", signal_file.display());
    }

    println!("Configuring kernel build files...");
    let defconfig = kernel_dir.join("arch/arm64/configs/defconfig");
    let kconfig = kernel_dir.join("drivers/Kconfig");
    let makefile = kernel_dir.join("drivers/Makefile");

    for (path, wire) in [
        (&defconfig, wire_defconfig as fn(&Path) -> Result<(), PatchError>),
        (&kconfig, wire_kconfig),
        (&makefile, wire_makefile),
    ] {
        if !path.exists() {
            log::warn!("{} not found, skipping", path.display());
            continue;
        }
        if mentions_rekernel(path) {
            log::warn!("'{}' already contains Re:Kernel", path.display());
            continue;
        }
        wire(path)?;
        println!("Updated {}", path.display());
    }

    println!("Re:Kernel patches applied successfully!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_kconfig_before_last_endmenu() {
        let content = "menu \"Device Drivers\"\n\nsource \"drivers/usb/Kconfig\"\n\nendmenu\n";
        let wired = insert_kconfig_source(content);
        let source_pos = wired.find("drivers/rekernel/Kconfig").unwrap();
        let endmenu_pos = wired.rfind("endmenu").unwrap();
        assert!(source_pos < endmenu_pos);
    }

    #[test]
    fn test_insert_kconfig_appends_without_endmenu() {
        let wired = insert_kconfig_source("source \"drivers/usb/Kconfig\"\n");
        assert!(wired.trim_end().ends_with("source \"drivers/rekernel/Kconfig\""));
    }

    #[test]
    fn test_insert_kconfig_idempotent() {
        let content = "source \"drivers/rekernel/Kconfig\"\nendmenu\n";
        assert_eq!(insert_kconfig_source(content), content);
    }

    #[test]
    fn test_wire_defconfig_appends_options() {
        let temp_dir = tempfile::tempdir().unwrap();
        let defconfig = temp_dir.path().join("defconfig");
        fs::write(&defconfig, "CONFIG_ARM64=y").unwrap();

        wire_defconfig(&defconfig).unwrap();
        let content = fs::read_to_string(&defconfig).unwrap();
        assert!(content.contains("CONFIG_REKERNEL=y"));
        assert!(content.contains("CONFIG_REKERNEL_NETWORK=n"));
        assert!(content.starts_with("CONFIG_ARM64=y\n"));
    }

    #[test]
    fn test_wire_makefile_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let makefile = temp_dir.path().join("Makefile");
        fs::write(&makefile, "obj-y += base/\n").unwrap();

        wire_makefile(&makefile).unwrap();
        wire_makefile(&makefile).unwrap();
        let content = fs::read_to_string(&makefile).unwrap();
        assert_eq!(content.matches("rekernel/").count(), 1);
    }

    #[test]
    fn test_mentions_rekernel_is_case_insensitive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Kconfig");
        fs::write(&path, "# Re:Kernel hooks\n").unwrap();
        assert!(mentions_rekernel(&path));
    }

    #[test]
    fn test_has_proc_ops_detection() {
        let temp_dir = tempfile::tempdir().unwrap();
        let kernel_dir = temp_dir.path();
        fs::create_dir_all(kernel_dir.join("include/linux")).unwrap();

        fs::write(
            kernel_dir.join("include/linux/proc_fs.h"),
            "struct file_operations;\n",
        )
        .unwrap();
        assert!(!has_proc_ops(kernel_dir));

        fs::write(
            kernel_dir.join("include/linux/proc_fs.h"),
            "struct proc_ops {\n\tint x;\n};\n",
        )
        .unwrap();
        assert!(has_proc_ops(kernel_dir));
    }

    #[test]
    fn test_move_dir_replaces_existing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("rekernel.c"), "// new\n").unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("stale.c"), "// old\n").unwrap();

        move_dir(&src, &dst).unwrap();
        assert!(dst.join("rekernel.c").exists());
        assert!(!dst.join("stale.c").exists());
        assert!(!src.exists());
    }
}
