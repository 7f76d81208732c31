//! Loader configuration.
//!
//! Values come from a TOML or JSON file, inline JSON in the environment, or
//! built-in defaults. Command-line overrides are applied by the caller.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deadline::{DEFAULT_DEADLINE, DeadlineGuard};
use crate::theme::{Brightness, HarmonyMode};

const CONFIG_PATH_VAR: &str = "DYNCOLOR_CONFIG_PATH";
const CONFIG_JSON_VAR: &str = "DYNCOLOR_CONFIG_JSON";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Source that produced the loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Settings for fetching images and deriving themes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Time (ms) a single load may take before it is abandoned and reported
    /// as timed out.
    pub deadline_ms: u64,
    /// When set, the remaining time is logged at this interval (ms) while a
    /// load is pending. Purely diagnostic.
    pub tick_interval_ms: Option<u64>,
    /// TCP/TLS connect timeout (ms) for the HTTP client.
    pub connect_timeout_ms: u64,
    /// Largest payload accepted, in bytes. Bigger responses are treated as a
    /// broken link.
    pub max_bytes: u64,
    /// User-Agent header sent with image requests.
    pub user_agent: String,
    /// Whether to derive a light or dark scheme.
    pub brightness: Brightness,
    /// Hue relationship between the seed and the tertiary accent.
    pub harmony: HarmonyMode,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_DEADLINE.as_millis() as u64,
            tick_interval_ms: None,
            connect_timeout_ms: 5_000,
            max_bytes: 20 * 1024 * 1024,
            user_agent: concat!("dyncolor/", env!("CARGO_PKG_VERSION"))
                .to_string(),
            brightness: Brightness::Light,
            harmony: HarmonyMode::Analogous,
        }
    }
}

impl LoaderConfig {
    /// Load configuration using environment variables.
    /// Evaluation order:
    /// 1) `$DYNCOLOR_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$DYNCOLOR_CONFIG_JSON` (inline JSON),
    /// 3) `dyncolor.toml` / `config/dyncolor.toml` in the working directory,
    /// 4) defaults.
    pub fn load_from_env() -> Result<(Self, ConfigSource), ConfigError> {
        if let Ok(path_str) = env::var(CONFIG_PATH_VAR)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var(CONFIG_JSON_VAR)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw, CONFIG_JSON_VAR)?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let origin = path.display().to_string();

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents, &origin)?,
            Some("toml") => {
                toml::from_str(&contents).map_err(|err| ConfigError::Parse {
                    origin: origin.clone(),
                    message: err.to_string(),
                })?
            }
            _ => Self::parse_from_str(&contents, &origin)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> Result<Self, ConfigError> {
        // Try TOML first, then JSON for convenience.
        let config: Self = toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                ConfigError::Parse {
                    origin: origin.to_string(),
                    message: format!(
                        "toml error: {toml_err}; json error: {json_err}"
                    ),
                }
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    fn parse_json(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse {
                origin: origin.to_string(),
                message: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "dyncolor.toml",
            "dyncolor.json",
            "config/dyncolor.toml",
            "config/dyncolor.json",
        ];

        CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
    }

    /// Reject values that would make every load fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "deadline_ms",
                reason: "must be greater than zero",
            });
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_bytes",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Deadline guard described by this configuration
    pub fn deadline_guard(&self) -> DeadlineGuard {
        let guard = DeadlineGuard::new(self.deadline());
        match self.tick_interval_ms {
            Some(ms) => guard.with_tick(Duration::from_millis(ms)),
            None => guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_ten_second_deadline() {
        let config = LoaderConfig::default();
        assert_eq!(config.deadline(), Duration::from_secs(10));
        assert_eq!(config.deadline_guard().tick(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let raw = r#"
            deadline_ms = 5000
            tick_interval_ms = 1000
            brightness = "dark"
            harmony = "complementary"
        "#;
        let config = LoaderConfig::parse_from_str(raw, "inline").unwrap();

        assert_eq!(config.deadline_ms, 5_000);
        assert_eq!(
            config.deadline_guard().tick(),
            Some(Duration::from_millis(1_000))
        );
        assert_eq!(config.brightness, Brightness::Dark);
        assert_eq!(config.harmony, HarmonyMode::Complementary);
        assert_eq!(config.max_bytes, LoaderConfig::default().max_bytes);
    }

    #[test]
    fn json_is_accepted_as_fallback() {
        let config =
            LoaderConfig::parse_from_str(r#"{"max_bytes": 1024}"#, "inline")
                .unwrap();
        assert_eq!(config.max_bytes, 1024);
    }

    #[test]
    fn garbage_reports_both_parsers() {
        let err = LoaderConfig::parse_from_str("{{nope", "inline").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("inline"));
        assert!(message.contains("json error"));
    }

    #[test]
    fn parsed_strings_are_validated() {
        let err = LoaderConfig::parse_from_str("max_bytes = 0\n", "inline")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_bytes",
                ..
            }
        ));
    }

    #[test]
    fn zero_deadline_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dyncolor.toml");
        fs::write(&path, "deadline_ms = 0\n").unwrap();

        let err = LoaderConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "deadline_ms",
                ..
            }
        ));
    }

    #[test]
    fn json_file_is_loaded_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dyncolor.json");
        fs::write(&path, r#"{"deadline_ms": 2500, "user_agent": "test"}"#)
            .unwrap();

        let config = LoaderConfig::load_from_file(&path).unwrap();
        assert_eq!(config.deadline_ms, 2_500);
        assert_eq!(config.user_agent, "test");
    }
}
