//! Tool settings loader and serialization.
//!
//! Settings are optional: every field has a default, and a missing file is
//! not an error. Lookup order is `./kbuild-ci.json`, then
//! `~/.config/kbuild-ci/settings.json`, then built-in defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const UPSTREAM_BASE: &str = "https://github.com/dabao1955/kernel_build_action/raw/main";
const UPSTREAM_PATCHES: &str =
    "https://raw.githubusercontent.com/dabao1955/kernel_build_action/main/rekernel/patches";

/// Persistent tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Raw-file base URL the feature patches are fetched from.
    pub mirror_base: String,
    /// Raw-file base URL for the Re:Kernel cocci patch set.
    pub patches_base: String,
    /// Default kernel source directory for clean/patch operations.
    pub kernel_dir: String,
    /// Default build output directory for clean operations.
    pub build_dir: String,
    /// Default log filename for `analyze` when no path is given.
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mirror_base: UPSTREAM_BASE.to_string(),
            patches_base: UPSTREAM_PATCHES.to_string(),
            kernel_dir: "kernel".to_string(),
            build_dir: "build".to_string(),
            log_file: "error.log".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. IO and parse errors surface.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::IoError(e)
            }
        })?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(ConfigError::IoError)?;
        Ok(())
    }

    /// Resolve settings from the standard lookup locations.
    ///
    /// A present-but-invalid file is a real error; absence falls through.
    pub fn load_or_default() -> Result<Settings, ConfigError> {
        let local = PathBuf::from("kbuild-ci.json");
        if local.exists() {
            return Settings::load(&local);
        }
        if let Some(global) = global_settings_path() {
            if global.exists() {
                return Settings::load(&global);
            }
        }
        Ok(Settings::default())
    }
}

/// Global settings path: ~/.config/kbuild-ci/settings.json
pub fn global_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/kbuild-ci/settings.json"))
}
