//! Configuration management for `spritemap.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [store], [output], [build], [log]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # SpriteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section    | Purpose                                      |
//! |------------|----------------------------------------------|
//! | `[store]`  | Where records and images live                |
//! | `[output]` | Image format and URL prefix                  |
//! | `[build]`  | Fingerprint mode and build lock              |
//! | `[log]`    | Verbose logging                              |

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, LogConfig, OutputConfig, StoreConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::{find_config_file, find_config_file_from};

use crate::log;
use crate::utils::path::{expand_path, normalize_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "spritemap.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing spritemap.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl SpriteConfig {
    /// Find `spritemap.toml` upward from the current directory and load it.
    ///
    /// Falls back to defaults rooted at the current directory when no file
    /// exists.
    pub fn discover() -> Result<Self> {
        match find_config_file(Path::new(CONFIG_FILE)) {
            Some(path) => Self::load(&path),
            None => {
                let cwd =
                    std::env::current_dir().context("Failed to get current working directory")?;
                let mut config = Self::default();
                config.finalize(&cwd);
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load, normalize and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_path(path)?;

        config.config_path = normalize_path(path);
        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.finalize(&root);
        config.validate()?;

        crate::debug!("config"; "loaded {}", config.config_path.display());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Paths stay as written; call [`SpriteConfig::finalize`] to resolve them.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            log!("warning"; "- {}", field);
        }
    }

    /// Resolve paths against `root` and apply global settings.
    pub fn finalize(&mut self, root: &Path) {
        self.root = normalize_path(root);
        if !self.store.root.as_os_str().is_empty() {
            self.store.root = expand_path(&self.store.root, &self.root);
        }
        crate::logger::set_verbose(self.log.verbose);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.store.validate(&mut diag);
        self.output.validate(&mut diag);
        self.build.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SpriteConfig {
    let (parsed, ignored) = SpriteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintMode;
    use crate::image::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_full_config() {
        let config = test_parse_config(
            r#"
[store]
root = "data"

[output]
format = "webp"
url_prefix = "/assets/sprites"

[build]
fingerprint = "content"
lock = false
"#,
        );
        assert_eq!(config.store.root, PathBuf::from("data"));
        assert_eq!(config.output.format, OutputFormat::Webp);
        assert_eq!(config.build.fingerprint, FingerprintMode::Content);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            SpriteConfig::parse_with_ignored("[output]\nformat = \"png\"\nquality = 90").unwrap();
        assert_eq!(ignored, ["output.quality"]);
    }

    #[test]
    fn test_load_resolves_store_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[store]\nroot = \"sprites\"").unwrap();

        let config = SpriteConfig::load(&path).unwrap();
        let root = normalize_path(dir.path());
        assert_eq!(config.root, root);
        assert_eq!(config.store.root, root.join("sprites"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SpriteConfig::load(Path::new("/nonexistent/spritemap.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Io(..))
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[store\nroot = ").unwrap();

        let err = SpriteConfig::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_load_reports_all_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[store]\nroot = \"\"\n[output]\nurl_prefix = \"\"").unwrap();

        let err = SpriteConfig::load(&path).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Diagnostics(diag)) => assert_eq!(diag.len(), 2),
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn test_from_str() {
        let config = SpriteConfig::from_str("[output]\nurl_prefix = \"/s\"").unwrap();
        assert_eq!(config.output.url_prefix, "/s");
        assert!(SpriteConfig::from_str("[output]\nformat = 3").is_err());
    }
}
