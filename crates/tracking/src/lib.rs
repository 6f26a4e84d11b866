//! Track aggregation for per-frame object detections
//!
//! Turns a single ordered stream of predictions (classification + box +
//! timestamp) from one camera into continuous object tracks, and derives the
//! read-only [`TrackView`] that notification rules are evaluated against.
//!
//! # Features
//! - Normalized frame geometry (boxes, points, movement vectors)
//! - Greedy association of each prediction to the best-overlapping track of
//!   the same classification
//! - Time-based pruning of idle tracks
//! - Aggregate track views (first/last/total/average box, movement)
//!
//! # Example
//! ```
//! use driveway_tracking::{BoundingBox, Prediction, Tracker, TrackerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = Tracker::new(TrackerConfig::default());
//!
//! let p = Prediction::new("car", BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3), 10.0);
//! let update = tracker.update(p, 10.0)?;
//! let view = tracker.view(update.track_id).expect("track was just updated");
//! assert_eq!(view.classification, "car");
//! # Ok(())
//! # }
//! ```

pub mod geometry;
pub mod track;
pub mod tracker;
pub mod view;

pub use geometry::{BoundingBox, MovementVector, Point};
pub use track::{Track, TrackId};
pub use tracker::{TrackUpdate, Tracker, UpdateKind};
pub use view::TrackView;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tracking errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),
    #[error("Prediction at t={t} is older than track {track_id} (last seen at t={last_seen})")]
    OutOfOrder {
        track_id: TrackId,
        last_seen: f64,
        t: f64,
    },
    #[error("Cannot add {got} prediction to {expected} track {track_id}")]
    ClassificationMismatch {
        track_id: TrackId,
        expected: String,
        got: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Drop tracks that have seen no prediction for this many seconds (default: 1.0).
    /// Keeps new motion from being appended to long-gone objects.
    pub inactive_track_prune_s: f64,
    /// Minimum share of a new box that must overlap the average of a track's
    /// last two boxes for the prediction to join that track (default: 0.2)
    pub track_connect_min_overlap: f64,
    /// Period of the prune tick that runs even when no detections arrive (default: 0.5)
    pub prune_tick_s: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            inactive_track_prune_s: 1.0,
            track_connect_min_overlap: 0.2,
            prune_tick_s: 0.5,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if !self.inactive_track_prune_s.is_finite() || self.inactive_track_prune_s <= 0.0 {
            return Err(TrackingError::InvalidConfig(
                "tracker.inactive_track_prune_s must be a positive number".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.track_connect_min_overlap) {
            return Err(TrackingError::InvalidConfig(
                "tracker.track_connect_min_overlap must be in [0, 1]".to_string(),
            ));
        }
        if !self.prune_tick_s.is_finite() || self.prune_tick_s <= 0.0 {
            return Err(TrackingError::InvalidConfig(
                "tracker.prune_tick_s must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single detection of one object in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub classification: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Capture time in seconds
    #[serde(rename = "t", alias = "timestamp")]
    pub t: f64,
}

impl Prediction {
    pub fn new(classification: impl Into<String>, bbox: BoundingBox, t: f64) -> Self {
        Self {
            classification: classification.into(),
            bbox,
            t,
        }
    }

    /// Reject predictions that would corrupt a track
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.classification.trim().is_empty() {
            return Err(TrackingError::InvalidPrediction(
                "classification is empty".to_string(),
            ));
        }
        if !self.t.is_finite() {
            return Err(TrackingError::InvalidPrediction(format!(
                "non-finite timestamp {}",
                self.t
            )));
        }
        if !self.bbox.is_finite() {
            return Err(TrackingError::InvalidPrediction(format!(
                "non-finite box coordinates {:?}",
                self.bbox
            )));
        }
        if !self.bbox.a.in_frame() || !self.bbox.b.in_frame() {
            return Err(TrackingError::InvalidPrediction(format!(
                "box {:?} lies outside the normalized frame",
                self.bbox
            )));
        }
        if !self.bbox.is_ordered() {
            return Err(TrackingError::InvalidPrediction(format!(
                "inverted box {:?}",
                self.bbox
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_overlap_out_of_range() {
        let config = TrackerConfig {
            track_connect_min_overlap: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("track_connect_min_overlap"));
    }

    #[test]
    fn test_config_rejects_non_positive_prune() {
        let config = TrackerConfig {
            inactive_track_prune_s: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prediction_validation() {
        let ok = Prediction::new("car", BoundingBox::from_corners(0.1, 0.1, 0.2, 0.2), 1.0);
        assert!(ok.validate().is_ok());

        let inverted = Prediction::new("car", BoundingBox::from_corners(0.3, 0.1, 0.2, 0.2), 1.0);
        assert!(matches!(
            inverted.validate(),
            Err(TrackingError::InvalidPrediction(_))
        ));

        let nan = Prediction::new(
            "car",
            BoundingBox::from_corners(f64::NAN, 0.1, 0.2, 0.2),
            1.0,
        );
        assert!(nan.validate().is_err());

        let outside = Prediction::new("car", BoundingBox::from_corners(0.1, 0.1, 1.2, 0.2), 1.0);
        assert!(outside.validate().is_err());

        let unnamed = Prediction::new(" ", BoundingBox::from_corners(0.1, 0.1, 0.2, 0.2), 1.0);
        assert!(unnamed.validate().is_err());

        let no_time = Prediction::new(
            "car",
            BoundingBox::from_corners(0.1, 0.1, 0.2, 0.2),
            f64::INFINITY,
        );
        assert!(no_time.validate().is_err());
    }

    #[test]
    fn test_degenerate_box_is_valid() {
        let p = Prediction::new("car", BoundingBox::from_corners(0.2, 0.2, 0.2, 0.4), 1.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_prediction_wire_format() {
        let json = r#"{"classification":"person","box":{"a":{"x":0.1,"y":0.2},"b":{"x":0.3,"y":0.4}},"t":12.5}"#;
        let p: Prediction = serde_json::from_str(json).unwrap();
        assert_eq!(p.classification, "person");
        assert_eq!(p.bbox, BoundingBox::from_corners(0.1, 0.2, 0.3, 0.4));
        assert_eq!(p.t, 12.5);

        let aliased = r#"{"classification":"car","box":{"a":{"x":0.0,"y":0.0},"b":{"x":0.1,"y":0.1}},"timestamp":3.0}"#;
        let p: Prediction = serde_json::from_str(aliased).unwrap();
        assert_eq!(p.t, 3.0);
    }
}
