//! Notification decisions and delivery gating
//!
//! [`DecisionEngine`] decides whether an updated track qualifies for a
//! notification. [`Notifier`] then applies the operator's mute window and
//! per-classification debounce before handing a [`Delivered`] record to the
//! delivery collaborator.
//!
//! # Example
//! ```
//! use driveway_notify::{Admission, CriteriaConfig, Decision, DecisionEngine, Notifier, NotifierConfig};
//! use driveway_tracking::{BoundingBox, Prediction, Tracker, TrackerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = Tracker::new(TrackerConfig::default());
//! let engine = DecisionEngine::new(&CriteriaConfig {
//!     min_track_length_s: 0.0,
//!     ..Default::default()
//! })?;
//! let notifier = Notifier::new(NotifierConfig::default());
//!
//! let p = Prediction::new("car", BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3), 0.0);
//! let id = tracker.update(p, 0.0)?.track_id;
//! if let Decision::Notify(decision) = engine.evaluate(tracker.view(id).expect("live track")) {
//!     assert!(matches!(notifier.admit(decision, 0.0), Admission::Delivered(_)));
//! }
//! # Ok(())
//! # }
//! ```

pub mod decision;
pub mod notification;
pub mod priority;
pub mod state;

pub use decision::{CriteriaConfig, Decision, DecisionEngine, NotifyDecision, SuppressionReason};
pub use notification::{Delivered, Feedback, FeedbackKind};
pub use priority::Priority;
pub use state::{Admission, MuteState, Notifier};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotifyError {
    #[error("Invalid priority '{0}' (expected 1-5, min, low, default, high, max or urgent)")]
    InvalidPriority(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Mute, debounce and priority settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifierConfig {
    /// Minimum spacing between deliveries of the same classification
    pub debounce_threshold_s: f64,
    pub default_priority: Priority,
    /// classification -> priority
    pub priorities: HashMap<String, Priority>,
    /// Mute duration used when a mute command names none
    pub mute_default_s: f64,
    /// How long a delivery key stays valid for control commands
    pub record_ttl_s: f64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            debounce_threshold_s: 60.0,
            default_priority: Priority::Default,
            priorities: HashMap::new(),
            mute_default_s: 600.0,
            record_ttl_s: 86_400.0,
        }
    }
}

impl NotifierConfig {
    pub fn validate(&self) -> Result<(), NotifyError> {
        let durations = [
            ("debounce_threshold_s", self.debounce_threshold_s),
            ("mute_default_s", self.mute_default_s),
            ("record_ttl_s", self.record_ttl_s),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(NotifyError::InvalidConfig(format!(
                    "notifier.{name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl CriteriaConfig {
    pub fn validate(&self) -> Result<(), NotifyError> {
        let check = |name: String, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(NotifyError::InvalidConfig(format!(
                    "notification_criteria.{name} must be a non-negative number of seconds, got {value}"
                )))
            }
        };
        check("min_track_length_s".to_string(), self.min_track_length_s)?;
        for (class, value) in &self.min_track_length_s_per_classification {
            check(format!("min_track_length_s_per_classification.{class}"), *value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_config_defaults() {
        let config: NotifierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NotifierConfig::default());
        assert_eq!(config.debounce_threshold_s, 60.0);
        assert_eq!(config.mute_default_s, 600.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_notifier_config_parses_priorities() {
        let config: NotifierConfig = serde_json::from_str(
            r#"{"default_priority": "low", "priorities": {"person": "urgent", "car": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.default_priority, Priority::Low);
        assert_eq!(config.priorities["person"], Priority::Max);
        assert_eq!(config.priorities["car"], Priority::High);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(serde_json::from_str::<NotifierConfig>(r#"{"debounce": 1}"#).is_err());
        assert!(serde_json::from_str::<CriteriaConfig>(r#"{"rule": "true"}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_durations() {
        let config = NotifierConfig {
            debounce_threshold_s: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("notifier.debounce_threshold_s"));

        let criteria = CriteriaConfig {
            min_track_length_s_per_classification: HashMap::from([("car".to_string(), f64::NAN)]),
            ..Default::default()
        };
        let err = criteria.validate().unwrap_err();
        assert!(err.to_string().contains("min_track_length_s_per_classification.car"));
    }
}
