//! Configuration file support
//!
//! `unpkg` runs fine without any configuration. An optional TOML file can
//! point at specific tool binaries, change where extractions fall back to
//! and pick how results are announced:
//!
//! ```toml
//! [tools]
//! xar = "/usr/bin/xar"
//! cpio = "~/bin/bsdcpio"
//!
//! [extraction]
//! max_collision_suffix = 999
//! fallback_dir = "~/Desktop"
//!
//! [notifications]
//! mode = "dialog"
//! app_name = "unpkg"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "UNPKG_CONFIG";

/// Highest `-N` suffix tried when the natural extraction directory is taken.
pub const DEFAULT_MAX_COLLISION_SUFFIX: u32 = 999;

fn default_max_collision_suffix() -> u32 {
    DEFAULT_MAX_COLLISION_SUFFIX
}

fn default_app_name() -> String {
    "unpkg".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpkgConfig {
    pub tools: ToolsConfig,
    pub extraction: ExtractionConfig,
    pub notifications: NotificationConfig,
}

/// `[tools]`: program names or paths; unset entries are looked up on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub xar: Option<String>,
    pub cpio: Option<String>,
    pub gzip: Option<String>,
    pub pax: Option<String>,
}

/// `[extraction]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_collision_suffix")]
    pub max_collision_suffix: u32,
    /// Used when the package's own folder is not writable.
    pub fallback_dir: Option<String>,
    /// Parent for private workspaces (system temp dir when unset).
    pub workspace_root: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_collision_suffix: default_max_collision_suffix(),
            fallback_dir: None,
            workspace_root: None,
        }
    }
}

impl ExtractionConfig {
    /// Where to extract when the package's parent is read-only.
    ///
    /// The configured directory wins, then the Desktop, then the home directory.
    pub fn fallback_dir(&self) -> PathBuf {
        self.fallback_dir
            .as_deref()
            .map(expand_path)
            .or_else(dirs::desktop_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.as_deref().map(expand_path)
    }
}

/// How results are shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// Styled lines on standard error.
    #[default]
    Console,
    /// A modal message box with a single OK button.
    Dialog,
}

/// `[notifications]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub mode: NotificationMode,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            mode: NotificationMode::default(),
            app_name: default_app_name(),
        }
    }
}

impl UnpkgConfig {
    /// Default config file location: `$UNPKG_CONFIG`, else `<config dir>/unpkg/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|p| p.join("unpkg").join("config.toml")))
    }

    /// Load the config from its default location, or return defaults if there is none.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the file exists but is not valid TOML for this schema.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the config from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: UnpkgConfig = toml::from_str("").unwrap();
        assert_eq!(config, UnpkgConfig::default());
        assert_eq!(config.extraction.max_collision_suffix, 999);
        assert_eq!(config.notifications.app_name, "unpkg");
        assert_eq!(config.notifications.mode, NotificationMode::Console);
    }

    #[test]
    fn test_partial_sections() {
        let config: UnpkgConfig = toml::from_str(
            r#"
            [tools]
            cpio = "/usr/local/bin/bsdcpio"

            [extraction]
            max_collision_suffix = 5

            [notifications]
            mode = "dialog"
            "#,
        )
        .unwrap();

        assert_eq!(config.tools.cpio.as_deref(), Some("/usr/local/bin/bsdcpio"));
        assert_eq!(config.tools.xar, None);
        assert_eq!(config.extraction.max_collision_suffix, 5);
        assert_eq!(config.notifications.mode, NotificationMode::Dialog);
        assert_eq!(config.notifications.app_name, "unpkg");
    }

    #[test]
    fn test_configured_fallback_dir_wins() {
        let extraction = ExtractionConfig {
            fallback_dir: Some("/srv/extracted".to_string()),
            ..ExtractionConfig::default()
        };
        assert_eq!(extraction.fallback_dir(), PathBuf::from("/srv/extracted"));
    }

    #[test]
    fn test_tilde_is_expanded() {
        let Some(home) = dirs::home_dir() else { return };
        let extraction = ExtractionConfig {
            workspace_root: Some("~/scratch".to_string()),
            ..ExtractionConfig::default()
        };
        assert_eq!(extraction.workspace_root(), Some(home.join("scratch")));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extraction]\nmax_collision_suffix = \"lots\"\n").unwrap();

        let err = UnpkgConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config { path: ref p, .. } if p == &path));
    }
}
