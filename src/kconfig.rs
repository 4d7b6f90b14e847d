//! Kernel `.config` inspection and rewriting.
//!
//! This module handles the text-level operations the feature checkers need:
//! counting symbol occurrences, testing enabled/disabled state, flipping
//! symbols between `NAME=y` and `# NAME is not set`, and appending missing
//! entries. Matching is literal line matching over the known `.config`
//! format; no Kconfig semantics are modeled.

use crate::error::ConfigError;
use crate::models::{CheckMode, CheckOutcome, Requirements};
use owo_colors::OwoColorize;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// A kernel `.config` loaded into memory. Mutations are buffered; call
/// [`ConfigFile::save`] to write them back.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    content: String,
}

impl ConfigFile {
    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Ok(ConfigFile {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Load a config file, refusing paths outside the current directory.
    ///
    /// CI invokes the checkers from the workspace root; a config path that
    /// escapes it is always a mistake.
    pub fn load_within_cwd(path: &Path) -> Result<Self, ConfigError> {
        let resolved = path
            .canonicalize()
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let cwd = std::env::current_dir()?;
        if !resolved.starts_with(&cwd) {
            return Err(ConfigError::OutsideWorkingDirectory(
                path.display().to_string(),
            ));
        }
        ConfigFile::load(&resolved)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Word-boundary occurrence count of a config symbol, comment lines
    /// included. More than one occurrence means a malformed config.
    pub fn occurrences(&self, name: &str) -> usize {
        let pattern = format!(r"\b{}\b", regex::escape(name));
        let regex = Regex::new(&pattern).expect("Invalid occurrence pattern");
        regex.find_iter(&self.content).count()
    }

    /// Is the symbol enabled, i.e. `NAME=y` or `NAME=m`?
    pub fn is_enabled(&self, name: &str) -> bool {
        let pattern = format!(r"(?m)^{}=(y|m)$", regex::escape(name));
        Regex::new(&pattern)
            .expect("Invalid enabled pattern")
            .is_match(&self.content)
    }

    /// Does the symbol have any `NAME=...` assignment line?
    pub fn is_set(&self, name: &str) -> bool {
        let pattern = format!(r"(?m)^{}=.*$", regex::escape(name));
        Regex::new(&pattern)
            .expect("Invalid assignment pattern")
            .is_match(&self.content)
    }

    /// Does the file contain this exact line?
    pub fn has_line(&self, line: &str) -> bool {
        let pattern = format!(r"(?m)^{}$", regex::escape(line));
        Regex::new(&pattern)
            .expect("Invalid line pattern")
            .is_match(&self.content)
    }

    /// Current assigned value of the symbol, if any.
    pub fn value(&self, name: &str) -> Option<String> {
        let pattern = format!(r"(?m)^{}=(.+)$", regex::escape(name));
        Regex::new(&pattern)
            .expect("Invalid value pattern")
            .captures(&self.content)
            .map(|caps| caps[1].to_string())
    }

    /// Enable a symbol by rewriting its `# NAME is not set` line to `NAME=y`.
    pub fn enable(&mut self, name: &str) {
        let pattern = format!(r"(?m)^# {} is not set$", regex::escape(name));
        let regex = Regex::new(&pattern).expect("Invalid not-set pattern");
        self.content = regex
            .replace_all(&self.content, format!("{}=y", name))
            .to_string();
    }

    /// Disable a symbol by rewriting its assignment to `# NAME is not set`.
    pub fn disable(&mut self, name: &str) {
        let pattern = format!(r"(?m)^{}=.*$", regex::escape(name));
        let regex = Regex::new(&pattern).expect("Invalid assignment pattern");
        self.content = regex
            .replace_all(&self.content, format!("# {} is not set", name))
            .to_string();
    }

    /// Replace a symbol's assignment line, keeping the old value as a comment.
    pub fn replace_assignment(&mut self, name: &str, assignment: &str, old_value: &str) {
        let pattern = format!(r"(?m)^{}=.*$", regex::escape(name));
        let regex = Regex::new(&pattern).expect("Invalid assignment pattern");
        self.content = regex
            .replace_all(
                &self.content,
                format!("# {} was {}\n{}", name, old_value, assignment),
            )
            .to_string();
    }

    /// Append `# NAME is not set` at the end of the file.
    pub fn append_not_set(&mut self, name: &str) {
        self.append_line(&format!("# {} is not set", name));
    }

    /// Append a raw line at the end of the file.
    pub fn append_line(&mut self, line: &str) {
        if !self.content.is_empty() && !self.content.ends_with('\n') {
            self.content.push('\n');
        }
        self.content.push_str(line);
        self.content.push('\n');
    }

    /// Write the buffered content back to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        fs::write(&self.path, &self.content)?;
        Ok(())
    }
}

/// Run a feature's requirements against a config file.
///
/// Check mode reports problems in red and leaves the file alone; write mode
/// creates missing symbols as not-set, flips on/off states, and rewrites
/// exact assignments. Duplicated symbols are always reported, never fixed.
/// The caller saves nothing: the file is written here when `mode` is
/// `Write` and any fix was applied.
pub fn check_requirements(
    config: &mut ConfigFile,
    reqs: &Requirements,
    mode: CheckMode,
) -> Result<CheckOutcome, ConfigError> {
    let write = mode == CheckMode::Write;
    let mut outcome = CheckOutcome::default();

    // Every listed symbol must appear exactly once.
    for name in reqs.enable.iter().chain(reqs.disable.iter()) {
        let count = config.occurrences(name);
        if count > 1 {
            println!(
                "{}",
                format!("{} appears more than once in the config file, fix this", name).red()
            );
            outcome.errors += 1;
        }
        if count == 0 {
            if write {
                println!("{}", format!("Creating {}", name).white());
                config.append_not_set(name);
                outcome.fixes += 1;
            } else {
                println!(
                    "{}",
                    format!(
                        "{} is neither enabled nor disabled in the config file",
                        name
                    )
                    .red()
                );
                outcome.errors += 1;
            }
        }
    }

    for name in reqs.enable {
        if config.is_enabled(name) {
            println!("{}", format!("{} is already set", name).green());
        } else if write {
            println!("{}", format!("Setting {}", name).white());
            config.enable(name);
            outcome.fixes += 1;
        } else {
            println!("{}", format!("{} is not set, set it", name).red());
            outcome.errors += 1;
        }
    }

    for assignment in reqs.exact {
        let Some((name, expected)) = assignment.split_once('=') else {
            continue;
        };
        if config.has_line(assignment) {
            println!(
                "{}",
                format!("{} is already set correctly.", assignment).green()
            );
            continue;
        }
        if config.is_set(name) {
            let current = config.value(name).unwrap_or_default();
            println!(
                "{}",
                format!("{} is set, but to {} not {}.", name, current, expected).red()
            );
            if write {
                println!("{}", format!("Setting {} correctly", assignment).green());
                config.replace_assignment(name, assignment, &current);
                outcome.fixes += 1;
            }
        } else if write {
            println!("{}", format!("Setting {}", assignment).white());
            config.append_line(assignment);
            outcome.fixes += 1;
        } else {
            println!("{}", format!("{} is not set", assignment).red());
            outcome.errors += 1;
        }
    }

    for name in reqs.disable {
        if config.is_enabled(name) {
            if write {
                println!("{}", format!("Unsetting {}", name).white());
                config.disable(name);
                outcome.fixes += 1;
            } else {
                println!("{}", format!("{} is set, unset it", name).red());
                outcome.errors += 1;
            }
        } else {
            println!("{}", format!("{} is already unset", name).green());
        }
    }

    if write && outcome.fixes > 0 {
        config.save()?;
    }

    if outcome.errors == 0 {
        println!(
            "{}",
            "\n\nConfig file checked, found no errors.\n\n".green()
        );
    } else {
        println!(
            "{}",
            format!(
                "\n\nConfig file checked, found {} errors that I did not fix.\n\n",
                outcome.errors
            )
            .red()
        );
    }

    log::info!(
        "Config check finished: {} errors, {} fixes ({} mode)",
        outcome.errors,
        outcome.fixes,
        mode
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with(content: &str) -> (tempfile::TempDir, ConfigFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".config");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, ConfigFile::load(&path).unwrap())
    }

    #[test]
    fn test_is_enabled_accepts_y_and_m() {
        let (_dir, config) = config_with("CONFIG_A=y\nCONFIG_B=m\nCONFIG_C=n\n");
        assert!(config.is_enabled("CONFIG_A"));
        assert!(config.is_enabled("CONFIG_B"));
        assert!(!config.is_enabled("CONFIG_C"));
        assert!(!config.is_enabled("CONFIG_MISSING"));
    }

    #[test]
    fn test_occurrences_counts_comments_too() {
        let (_dir, config) = config_with("# CONFIG_A is not set\nCONFIG_A=y\nCONFIG_AB=y\n");
        assert_eq!(config.occurrences("CONFIG_A"), 2);
        assert_eq!(config.occurrences("CONFIG_AB"), 1);
    }

    #[test]
    fn test_enable_flips_not_set_line() {
        let (_dir, mut config) = config_with("# CONFIG_VETH is not set\n");
        config.enable("CONFIG_VETH");
        assert_eq!(config.content(), "CONFIG_VETH=y\n");
    }

    #[test]
    fn test_disable_rewrites_assignment() {
        let (_dir, mut config) = config_with("CONFIG_SCHED_WALT=y\n");
        config.disable("CONFIG_SCHED_WALT");
        assert_eq!(config.content(), "# CONFIG_SCHED_WALT is not set\n");
    }

    #[test]
    fn test_append_not_set_handles_missing_newline() {
        let (_dir, mut config) = config_with("CONFIG_A=y");
        config.append_not_set("CONFIG_B");
        assert_eq!(config.content(), "CONFIG_A=y\n# CONFIG_B is not set\n");
    }

    #[test]
    fn test_value_extraction() {
        let (_dir, config) = config_with("CONFIG_LOCALVERSION=\"-perf\"\n");
        assert_eq!(
            config.value("CONFIG_LOCALVERSION"),
            Some("\"-perf\"".to_string())
        );
        assert_eq!(config.value("CONFIG_MISSING"), None);
    }

    #[test]
    fn test_check_mode_counts_errors_without_touching_file() {
        let (_dir, mut config) = config_with("# CONFIG_ON is not set\nCONFIG_OFF=y\n");
        let reqs = Requirements {
            enable: &["CONFIG_ON", "CONFIG_ABSENT"],
            disable: &["CONFIG_OFF"],
            exact: &[],
        };
        let outcome = check_requirements(&mut config, &reqs, CheckMode::Check).unwrap();
        // CONFIG_ABSENT missing (1), CONFIG_ON not set (1), CONFIG_ABSENT
        // not set (1), CONFIG_OFF set (1).
        assert_eq!(outcome.errors, 4);
        assert_eq!(outcome.fixes, 0);

        let on_disk = fs::read_to_string(config.path()).unwrap();
        assert_eq!(on_disk, "# CONFIG_ON is not set\nCONFIG_OFF=y\n");
    }

    #[test]
    fn test_write_mode_fixes_and_saves() {
        let (_dir, mut config) = config_with("# CONFIG_ON is not set\nCONFIG_OFF=y\n");
        let reqs = Requirements {
            enable: &["CONFIG_ON", "CONFIG_ABSENT"],
            disable: &["CONFIG_OFF"],
            exact: &[],
        };
        let outcome = check_requirements(&mut config, &reqs, CheckMode::Write).unwrap();
        assert_eq!(outcome.errors, 0);
        // Create CONFIG_ABSENT, set CONFIG_ON, set CONFIG_ABSENT, unset
        // CONFIG_OFF.
        assert_eq!(outcome.fixes, 4);

        let on_disk = fs::read_to_string(config.path()).unwrap();
        assert!(on_disk.contains("CONFIG_ON=y"));
        assert!(on_disk.contains("CONFIG_ABSENT=y"));
        assert!(on_disk.contains("# CONFIG_OFF is not set"));
    }

    #[test]
    fn test_duplicate_symbol_reported_not_fixed() {
        let (_dir, mut config) = config_with("CONFIG_DUP=y\nCONFIG_DUP=y\n");
        let reqs = Requirements {
            enable: &["CONFIG_DUP"],
            disable: &[],
            exact: &[],
        };
        let outcome = check_requirements(&mut config, &reqs, CheckMode::Write).unwrap();
        assert_eq!(outcome.errors, 1);
        assert_eq!(outcome.fixes, 0);
    }

    #[test]
    fn test_exact_assignment_appended_when_missing() {
        let (_dir, mut config) = config_with("CONFIG_A=y\n");
        let reqs = Requirements {
            enable: &[],
            disable: &[],
            exact: &["CONFIG_HZ=300"],
        };
        let outcome = check_requirements(&mut config, &reqs, CheckMode::Write).unwrap();
        assert_eq!(outcome.fixes, 1);
        assert!(config.content().contains("CONFIG_HZ=300"));
    }

    #[test]
    fn test_exact_assignment_rewrite_preserves_old_value() {
        let (_dir, mut config) = config_with("CONFIG_HZ=100\n");
        let reqs = Requirements {
            enable: &[],
            disable: &[],
            exact: &["CONFIG_HZ=300"],
        };
        check_requirements(&mut config, &reqs, CheckMode::Write).unwrap();
        assert!(config.content().contains("# CONFIG_HZ was 100"));
        assert!(config.content().contains("CONFIG_HZ=300"));
    }
}
