//! Configuration management for uavo-upgrader.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::definitions::{is_valid_digest, is_valid_version_id};
use crate::error::{Error, Result};
use crate::mixer::DISABLED_OPTION;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "uavo-upgrader";

/// Default definition archive directory name, inside the data directory.
const DEFINITIONS_DIR_NAME: &str = "definitions";

/// Environment variable prefix. Nested keys are separated by `__`, e.g.
/// `UAVO_UPGRADER_IMPORT__MAX_PAYLOAD_BYTES`.
const ENV_PREFIX: &str = "UAVO_UPGRADER_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `UAVO_UPGRADER_`)
/// 2. TOML config file at `~/.config/uavo-upgrader/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Definition archive configuration.
    pub definitions: DefinitionsConfig,
    /// Upload decoding configuration.
    pub import: ImportConfig,
    /// Mixer channel sanitation configuration.
    pub sanitize: SanitizeConfig,
}

/// Where definition bundles come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsConfig {
    /// Directory scanned for `<githash>.tgz` archives.
    /// Defaults to `~/.local/share/uavo-upgrader/definitions`
    pub archive_dir: Option<PathBuf>,
    /// Explicit version to archive mappings. Relative paths are resolved
    /// against the archive directory.
    pub versions: BTreeMap<String, PathBuf>,
    /// Pinned blake3 digests (lowercase hex) of archives, by version.
    pub digests: BTreeMap<String, String>,
}

/// Upload decoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Try to inflate uploads as zlib before importing.
    pub decompress: bool,
    /// Largest accepted upload, before and after decompression.
    pub max_payload_bytes: usize,
}

/// Mixer channel sanitation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Zero PWM bounds of disabled mixer channels during upgrade.
    pub enabled: bool,
    /// Mixer type option name that marks a channel as disabled.
    pub disabled_option: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            decompress: true,
            max_payload_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled_option: DISABLED_OPTION.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `UAVO_UPGRADER_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.import.max_payload_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_payload_bytes must be greater than 0".to_string(),
            });
        }

        if self.sanitize.disabled_option.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "disabled_option cannot be empty".to_string(),
            });
        }

        for version in self
            .definitions
            .versions
            .keys()
            .chain(self.definitions.digests.keys())
        {
            if !is_valid_version_id(version) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid version identifier: {version}"),
                });
            }
        }

        for (version, digest) in &self.definitions.digests {
            if !is_valid_digest(digest) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid blake3 digest for {version}: {digest}"),
                });
            }
        }

        Ok(())
    }

    /// Get the definition archive directory, resolving defaults if not set.
    #[must_use]
    pub fn definitions_dir(&self) -> PathBuf {
        self.definitions
            .archive_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DEFINITIONS_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.import.decompress);
        assert!(config.sanitize.enabled);
        assert_eq!(config.sanitize.disabled_option, "Disabled");
        assert!(config.definitions.versions.is_empty());
        assert!(config.definitions.digests.is_empty());
    }

    #[test]
    fn test_default_import_config() {
        let import = ImportConfig::default();

        assert!(import.decompress);
        assert_eq!(import.max_payload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_payload_limit() {
        let mut config = Config::default();
        config.import.max_payload_bytes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_payload_bytes"));
    }

    #[test]
    fn test_validate_empty_disabled_option() {
        let mut config = Config::default();
        config.sanitize.disabled_option = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("disabled_option"));
    }

    #[test]
    fn test_validate_bad_version_identifier() {
        let mut config = Config::default();
        config
            .definitions
            .versions
            .insert("../escape".to_string(), PathBuf::from("x.tgz"));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid version identifier"));
    }

    #[test]
    fn test_validate_bad_digest() {
        let mut config = Config::default();
        config
            .definitions
            .digests
            .insert("Release-20160120.3".to_string(), "not-hex".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid blake3 digest"));
    }

    #[test]
    fn test_definitions_dir_default() {
        let config = Config::default();
        let path = config.definitions_dir();

        assert!(path.to_string_lossy().contains("uavo-upgrader"));
        assert!(path.ends_with("definitions"));
    }

    #[test]
    fn test_definitions_dir_custom() {
        let mut config = Config::default();
        config.definitions.archive_dir = Some(PathBuf::from("/srv/defs"));

        assert_eq!(config.definitions_dir(), PathBuf::from("/srv/defs"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("uavo-upgrader"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[definitions]
archive_dir = "/srv/defs"

[definitions.versions]
"Release-20160120.3" = "Release-20160120.3.tgz"

[import]
max_payload_bytes = 4096

[sanitize]
enabled = false
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.definitions_dir(), PathBuf::from("/srv/defs"));
        assert_eq!(
            config.definitions.versions.get("Release-20160120.3"),
            Some(&PathBuf::from("Release-20160120.3.tgz"))
        );
        assert_eq!(config.import.max_payload_bytes, 4096);
        assert!(config.import.decompress);
        assert!(!config.sanitize.enabled);
        assert_eq!(config.sanitize.disabled_option, "Disabled");
    }

    #[test]
    fn test_load_invalid_toml_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[import]\nmax_payload_bytes = 0").unwrap();

        let err = Config::load_from(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("max_payload_bytes"));
        assert!(json.contains("disabled_option"));
    }

    #[test]
    fn test_sanitize_config_deserialize() {
        let json = r#"{"disabled_option": "Off"}"#;
        let sanitize: SanitizeConfig = serde_json::from_str(json).unwrap();
        assert!(sanitize.enabled);
        assert_eq!(sanitize.disabled_option, "Off");
    }
}
