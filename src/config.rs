//! Persistent default flags.
//!
//! Defaults are stored as command-line tokens, one flag per line, in a
//! global config file and an optional `.canvasrc` in the working
//! directory. Command-line flags are merged over both with
//! [`ConfigFlags::union`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const APP_DIR: &str = "canvas";
const LOCAL_RC: &str = ".canvasrc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub mouse: bool,
    pub show_urls: bool,
    pub watch_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: switches are or-ed, values from `other`
    /// win when present.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            mouse: self.mouse || other.mouse,
            show_urls: self.show_urls || other.show_urls,
            watch_dir: other.watch_dir.clone().or_else(|| self.watch_dir.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_RC)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

/// Load flags from `path`; a missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# canvas defaults (saved with --save)".to_string()];
    if flags.mouse {
        lines.push("--mouse".to_string());
    }
    if flags.show_urls {
        lines.push("--show-urls".to_string());
    }
    if let Some(dir) = &flags.watch_dir {
        lines.push(format!("--watch {}", dir.display()));
    }
    if let Some(log) = &flags.log_file {
        lines.push(format!("--log-file {}", log.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the flags this module knows out of a token list. Unknown tokens
/// are ignored, so a full argv can be passed.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--mouse" | "-m" => flags.mouse = true,
            "--show-urls" => flags.show_urls = true,
            "--watch" | "-w" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.watch_dir = Some(PathBuf::from(next));
                    i += 1;
                }
            }
            "--log-file" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.log_file = Some(PathBuf::from(next));
                    i += 1;
                }
            }
            _ => {
                if let Some(value) = token.strip_prefix("--watch=") {
                    flags.watch_dir = Some(PathBuf::from(value));
                } else if let Some(value) = token.strip_prefix("--log-file=") {
                    flags.log_file = Some(PathBuf::from(value));
                }
            }
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "canvas",
            "-m",
            "--show-urls",
            "--watch",
            "notes/canvas",
            "--log-file=canvas.log",
            "--file",
            "draft.md",
        ]));
        assert!(flags.mouse);
        assert!(flags.show_urls);
        assert_eq!(flags.watch_dir, Some(PathBuf::from("notes/canvas")));
        assert_eq!(flags.log_file, Some(PathBuf::from("canvas.log")));
    }

    #[test]
    fn test_trailing_value_flag_is_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--watch"]));
        assert_eq!(flags, ConfigFlags::default());
    }

    #[test]
    fn test_config_union_prefers_cli_values() {
        let file = ConfigFlags {
            mouse: true,
            watch_dir: Some(PathBuf::from("from-file")),
            log_file: Some(PathBuf::from("file.log")),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            show_urls: true,
            watch_dir: Some(PathBuf::from("from-cli")),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.mouse);
        assert!(merged.show_urls);
        assert_eq!(merged.watch_dir, Some(PathBuf::from("from-cli")));
        assert_eq!(merged.log_file, Some(PathBuf::from("file.log")));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".canvasrc");
        let flags = ConfigFlags {
            mouse: true,
            show_urls: true,
            watch_dir: Some(PathBuf::from("canvas-dir")),
            log_file: Some(PathBuf::from("canvas.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
