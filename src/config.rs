//! Configuration file loading
//!
//! One JSON document, read once at startup. Every section and key is
//! optional; unknown keys are rejected so typos surface immediately.

use std::path::{Path, PathBuf};

use driveway_notify::{CriteriaConfig, NotifierConfig, NotifyError};
use driveway_rules::CompileError;
use driveway_tracking::{TrackerConfig, TrackingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Tracker(#[from] TrackingError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("Invalid notification_criteria.track_cel: {0}")]
    Rule(#[from] CompileError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Control server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    pub enabled: bool,
    pub bind_to: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_to: "0.0.0.0".to_string(),
            port: 5550,
        }
    }
}

impl WebConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_to, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub notification_criteria: CriteriaConfig,
    pub notifier: NotifierConfig,
    pub web: WebConfig,
}

impl Config {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.notification_criteria.validate()?;
        self.notifier.validate()?;
        if self.web.enabled && self.web.bind_to.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "web.bind_to must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveway_notify::Priority;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tracker.track_connect_min_overlap, 0.2);
        assert_eq!(config.notification_criteria.min_track_length_s, 1.0);
        assert_eq!(config.web.addr(), "0.0.0.0:5550");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_json(
            r#"{
                "tracker": {"inactive_track_prune_s": 2.5},
                "notification_criteria": {
                    "classification_allowlist": ["car", "person"],
                    "track_cel": "track.length_t > 2.0"
                },
                "notifier": {"priorities": {"person": "high"}},
                "web": {"enabled": false}
            }"#,
        )
        .unwrap();
        assert_eq!(config.tracker.inactive_track_prune_s, 2.5);
        assert_eq!(config.tracker.track_connect_min_overlap, 0.2);
        assert_eq!(config.notification_criteria.classification_allowlist.len(), 2);
        assert_eq!(config.notifier.priorities["person"], Priority::High);
        assert!(!config.web.enabled);
        assert_eq!(config.web.port, 5550);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            Config::from_json(r#"{"tracker": {"prune_s": 1.0}}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"ntfy": {}}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_out_of_range_overlap_names_the_key() {
        let err = Config::from_json(r#"{"tracker": {"track_connect_min_overlap": 1.5}}"#)
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("tracker.track_connect_min_overlap must be in [0, 1]"));
    }

    #[test]
    fn test_bad_priority_is_a_parse_error() {
        assert!(matches!(
            Config::from_json(r#"{"notifier": {"default_priority": "loud"}}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
