//! Translator configuration
//!
//! The server version decides which clause forms the type-filter translator
//! may emit. The log level sets the process-wide logging threshold when a
//! context is created.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Event, Logger, Severity};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid translator config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Version of the target database server
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Query features available on the target server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCapabilities {
    /// `{ "field.0" : { "$exists" : false } }` is understood (2.0 and later)
    pub supports_indexed_element_exists: bool,
}

impl ServerCapabilities {
    pub fn for_version(version: ServerVersion) -> Self {
        Self {
            supports_indexed_element_exists: version >= ServerVersion::new(2, 0),
        }
    }
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self::for_version(default_server_version())
    }
}

/// Translator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Version of the server queries are sent to (default: 4.0)
    #[serde(default = "default_server_version")]
    pub server_version: ServerVersion,

    /// Minimum severity written by the logger (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_server_version() -> ServerVersion {
    ServerVersion::new(4, 0)
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            server_version: default_server_version(),
            log_level: default_log_level(),
        }
    }
}

impl TranslatorConfig {
    /// Config targeting a specific server version
    pub fn with_server_version(major: u32, minor: u32) -> Self {
        Self {
            server_version: ServerVersion::new(major, minor),
            ..Default::default()
        }
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    /// Applies `log_level` to the process logger. Call once during setup.
    pub fn init_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }

    pub fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::for_version(self.server_version)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;

        let version = config.server_version.to_string();
        Logger::info(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("server_version", version.as_str()),
            ],
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::default();
        assert_eq!(config.server_version, ServerVersion::new(4, 0));
        assert_eq!(config.log_level, Severity::Info);
        assert!(config.capabilities().supports_indexed_element_exists);
    }

    #[test]
    fn test_old_server_lacks_indexed_exists() {
        let config = TranslatorConfig::with_server_version(1, 8);
        assert!(!config.capabilities().supports_indexed_element_exists);
        assert!(TranslatorConfig::with_server_version(2, 0)
            .capabilities()
            .supports_indexed_element_exists);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TranslatorConfig::from_json_str(r#"{ "log_level": "warn" }"#).unwrap();
        assert_eq!(config.log_level, Severity::Warn);
        assert_eq!(config.server_version, ServerVersion::new(4, 0));

        let config = TranslatorConfig::from_json_str(r#"{ "server_version": { "major": 1 } }"#).unwrap();
        assert_eq!(config.server_version, ServerVersion::new(1, 0));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = TranslatorConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "server_version": {{ "major": 3, "minor": 6 }} }}"#).unwrap();

        let config = TranslatorConfig::load(file.path()).unwrap();
        assert_eq!(config.server_version.to_string(), "3.6");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TranslatorConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
