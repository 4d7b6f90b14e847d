//! Build artifact cleanup after a kernel CI run.
//!
//! Removes the kernel source tree, build output, flashable packaging and
//! stray temp files, optionally the downloaded toolchains and the ccache,
//! and emits `unset` lines for the build environment variables so the CI
//! shell can `eval` them away.

use crate::error::CleanError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Build environment variables cleared by `--env`.
pub const ENV_VARS: &[&str] = &[
    "CMD_PATH",
    "CMD_CC",
    "CMD_CLANG_TRIPLE",
    "CMD_CROSS_COMPILE",
    "CMD_CROSS_COMPILE_ARM32",
    "USE_CCACHE",
    "CLANG_PATH",
    "HOMES",
    "KVER",
    "SWAP_FILE",
    "SUBLEVEL",
    "PATCHLEVEL",
    "VERSION",
    "GCC_DIR",
    "FILE",
    "FILE_NAME",
    "MATCHED_DIR",
    "FOLDER",
    "FOLDER_NAME",
    "GCC64",
    "GCC32",
    "NEED_GCC",
    "AOSP_CLANG_URL",
    "OTHER_CLANG_URL",
    "AOSP_GCC64_URL",
    "AOSP_GCC32_URL",
    "AOSP_GCC_BRANCH",
    "OTHER_GCC64_URL",
    "OTHER_GCC32_URL",
    "EXTRA_ARGS",
    "make_args",
    "SAFE_EXTRA_ARGS",
    "EXTRA_CMD",
    "FMT",
    "HOST_ARCH",
];

/// Stray files some build steps leave in the workspace root.
const TEMP_FILES: &[&str] = &["boot.img", "magiskboot", "nohup.out"];

/// Toolchain directories downloaded into the home directory.
const TOOLCHAIN_DIRS: &[&str] = &["clang", "gcc-64", "gcc-32"];

/// Remove a directory tree if it exists.
fn remove_dir(path: &Path, what: &str) -> Result<(), CleanError> {
    if !path.exists() {
        return Ok(());
    }
    println!("Removing {}: {}", what, path.display());
    std::fs::remove_dir_all(path).map_err(|e| CleanError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Clean the kernel source directory.
pub fn clean_kernel_source(kernel_dir: &Path) -> Result<(), CleanError> {
    remove_dir(kernel_dir, "kernel directory")
}

/// Clean the build output directory.
pub fn clean_build_artifacts(build_dir: &Path) -> Result<(), CleanError> {
    remove_dir(build_dir, "build directory")
}

/// Clean the AnyKernel3 packaging directory.
pub fn clean_anykernel3(workspace: &Path) -> Result<(), CleanError> {
    remove_dir(&workspace.join("AnyKernel3"), "AnyKernel3 directory")
}

/// Clean stray temp files (and magiskboot, which is sometimes a directory).
pub fn clean_temp_files(workspace: &Path) -> Result<(), CleanError> {
    for name in TEMP_FILES {
        let path = workspace.join(name);
        if !path.exists() {
            continue;
        }
        println!("Removing temporary file: {}", path.display());
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        result.map_err(|e| CleanError::RemoveFailed {
            path: path.clone(),
            source: e,
        })?;
    }
    Ok(())
}

/// Clean downloaded toolchains from the home directory.
pub fn clean_toolchains() -> Result<(), CleanError> {
    let home = dirs::home_dir().ok_or(CleanError::NoHomeDirectory)?;
    for name in TOOLCHAIN_DIRS {
        remove_dir(&home.join(name), "toolchain")?;
    }
    Ok(())
}

/// Clear the compiler cache. A missing ccache binary is not an error.
pub fn clean_ccache() {
    match Command::new("ccache").arg("-C").output() {
        Ok(output) if output.status.success() => println!("Ccache cleared"),
        Ok(_) => log::warn!("ccache -C returned a failure status"),
        Err(e) => log::debug!("ccache not available: {}", e),
    }
}

/// Print `unset VAR` lines for every build variable present in the
/// environment, for consumption via `eval $(kbuild_ci clean --env)`.
pub fn print_env_unsets() {
    for var in ENV_VARS {
        if std::env::var_os(var).is_some() {
            println!("unset {}", var);
        }
    }
}

/// Detect the host package manager, for the closing info line.
pub fn detect_package_manager() -> &'static str {
    for (path, name) in [
        ("/bin/apt", "apt"),
        ("/usr/bin/apt", "apt"),
        ("/bin/pacman", "pacman"),
        ("/usr/bin/pacman", "pacman"),
    ] {
        if Path::new(path).exists() {
            return name;
        }
    }
    "unknown"
}

/// What a clean run should touch.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub kernel_dir: PathBuf,
    pub build_dir: PathBuf,
    pub toolchains: bool,
    pub ccache: bool,
    pub all: bool,
    pub env: bool,
}

/// Run a cleanup pass over the workspace (the current directory).
pub fn run(options: &CleanOptions) -> Result<(), CleanError> {
    // --env is emit-only: any other output would corrupt the eval stream.
    if options.env && !options.all {
        eprintln!("# Run: eval $(kbuild_ci clean --env)");
        print_env_unsets();
        return Ok(());
    }

    let workspace = std::env::current_dir().map_err(|e| CleanError::RemoveFailed {
        path: PathBuf::from("."),
        source: e,
    })?;

    if options.all {
        println!("Cleaning all build artifacts...");
    }

    clean_kernel_source(&options.kernel_dir)?;
    clean_build_artifacts(&options.build_dir)?;
    clean_anykernel3(&workspace)?;
    clean_temp_files(&workspace)?;

    if options.toolchains || options.all {
        clean_toolchains()?;
    }
    if options.ccache || options.all {
        clean_ccache();
    }
    if options.all {
        print_env_unsets();
        println!("Clean completed!");
    }

    println!("Detected package manager: {}", detect_package_manager());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_clean_kernel_source_removes_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let kernel_dir = temp_dir.path().join("kernel");
        fs::create_dir_all(kernel_dir.join("drivers")).unwrap();
        fs::write(kernel_dir.join("Makefile"), "all:\n").unwrap();

        clean_kernel_source(&kernel_dir).unwrap();
        assert!(!kernel_dir.exists());
    }

    #[test]
    fn test_clean_missing_dirs_is_quiet() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(clean_kernel_source(&temp_dir.path().join("absent")).is_ok());
        assert!(clean_build_artifacts(&temp_dir.path().join("absent")).is_ok());
        assert!(clean_anykernel3(temp_dir.path()).is_ok());
        assert!(clean_temp_files(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_clean_temp_files_removes_listed_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("boot.img"), b"img").unwrap();
        fs::write(temp_dir.path().join("nohup.out"), b"log").unwrap();
        fs::write(temp_dir.path().join("keep.txt"), b"keep").unwrap();

        clean_temp_files(temp_dir.path()).unwrap();
        assert!(!temp_dir.path().join("boot.img").exists());
        assert!(!temp_dir.path().join("nohup.out").exists());
        assert!(temp_dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_clean_temp_files_handles_magiskboot_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("magiskboot")).unwrap();
        clean_temp_files(temp_dir.path()).unwrap();
        assert!(!temp_dir.path().join("magiskboot").exists());
    }

    #[test]
    fn test_detect_package_manager_is_known_value() {
        let detected = detect_package_manager();
        assert!(["apt", "pacman", "unknown"].contains(&detected));
    }

    #[test]
    fn test_env_vars_list_shape() {
        assert!(ENV_VARS.contains(&"USE_CCACHE"));
        assert!(ENV_VARS.contains(&"make_args"));
        assert_eq!(ENV_VARS.len(), 35);
    }
}
