//! Configuration loading for edit-server.
//!
//! Configuration is loaded from a TOML file (default: `textsync.toml`).
//! Every section and field is optional.

use serde::Deserialize;
use std::path::PathBuf;
use textsync_edit_core::EditLimits;

/// Root configuration for edit-server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Session and content limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Idle-session eviction.
    #[serde(default)]
    pub eviction: EvictionConfig,
}

/// Session and content limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Live sessions allowed before registration evicts an unfocused one (default: 256).
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Longest chunk a single GetText returns, in code points (default: 4096).
    #[serde(default = "default_max_get_text_chars")]
    pub max_get_text_chars: usize,
    /// Longest text a single SetText inserts (default: 64Ki code points).
    #[serde(default = "default_max_insert_chars")]
    pub max_insert_chars: usize,
    /// Longest a field's content may grow (default: 1Mi code points).
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

/// Idle-session eviction configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EvictionConfig {
    /// Enable the periodic eviction task (default: true).
    #[serde(default = "default_eviction_enabled")]
    pub enabled: bool,
    /// Seconds between eviction sweeps (default: 60).
    #[serde(default = "default_eviction_interval")]
    pub interval_secs: u64,
    /// Unfocused sessions idle at least this long are evicted (default: 300).
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

// Default value functions
fn default_max_sessions() -> usize {
    256
}

fn default_max_get_text_chars() -> usize {
    4096
}

fn default_max_insert_chars() -> usize {
    64 * 1024
}

fn default_max_content_chars() -> usize {
    1024 * 1024
}

fn default_eviction_enabled() -> bool {
    true
}

fn default_eviction_interval() -> u64 {
    60
}

fn default_idle_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            max_get_text_chars: default_max_get_text_chars(),
            max_insert_chars: default_max_insert_chars(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            enabled: default_eviction_enabled(),
            interval_secs: default_eviction_interval(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl LimitsConfig {
    /// Per-field limits handed to each synchronizer.
    pub fn edit_limits(&self) -> EditLimits {
        EditLimits {
            max_get_text_chars: self.max_get_text_chars,
            max_insert_chars: self.max_insert_chars,
            max_content_chars: self.max_content_chars,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// value is out of range.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would leave the registry unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.max_sessions",
                reason: "must be at least 1",
            });
        }
        if self.limits.max_get_text_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.max_get_text_chars",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending key.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.limits.max_sessions, 256);
        assert_eq!(config.limits.max_get_text_chars, 4096);
        assert!(config.eviction.enabled);
        assert_eq!(config.eviction.idle_timeout_secs, 300);
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[limits]
max_sessions = 8
max_get_text_chars = 512

[eviction]
interval_secs = 5
idle_timeout_secs = 30
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.limits.max_sessions, 8);
        assert_eq!(config.limits.max_get_text_chars, 512);
        assert_eq!(config.limits.max_insert_chars, 64 * 1024);
        assert_eq!(config.eviction.interval_secs, 5);
        assert_eq!(config.eviction.idle_timeout_secs, 30);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.limits.max_content_chars, 1024 * 1024);
        assert_eq!(config.eviction.interval_secs, 60);
    }

    #[test]
    fn edit_limits_mirror_config() {
        let limits = LimitsConfig {
            max_insert_chars: 10,
            ..LimitsConfig::default()
        };
        let edit = limits.edit_limits();
        assert_eq!(edit.max_insert_chars, 10);
        assert_eq!(edit.max_get_text_chars, 4096);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[eviction]\nenabled = false").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.eviction.enabled);
    }

    #[test]
    fn from_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_sessions = \"many\"").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_get_text_chars = 0").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "limits.max_get_text_chars",
                ..
            }
        ));
    }

    #[test]
    fn zero_sessions_rejected() {
        let config: Config = toml::from_str("[limits]\nmax_sessions = 0").unwrap();
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn from_file_missing() {
        let err = Config::from_file(std::path::Path::new("/nonexistent/textsync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
