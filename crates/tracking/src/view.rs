//! Read-only aggregate of a track
//!
//! Rebuilt after every update and handed to the decision path; nothing
//! downstream ever sees a mutable [`Track`].

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, MovementVector, Point, Prediction, Track, TrackId};

/// Derived, immutable snapshot of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackView {
    pub id: TrackId,
    pub classification: String,
    pub predictions: Vec<Prediction>,
    pub first_t: f64,
    pub last_t: f64,
    /// `last_t - first_t`, in seconds
    pub length_t: f64,
    pub first_box: BoundingBox,
    pub last_box: BoundingBox,
    /// Smallest box covering every prediction's box
    pub total_box: BoundingBox,
    /// Corner-wise mean of every prediction's box
    pub average_box: BoundingBox,
    /// Largest-area box seen; the best candidate for a snapshot
    pub best_box: BoundingBox,
    /// From the first box's center to the last box's center
    pub movement_vector: MovementVector,
}

impl TrackView {
    pub fn build(track: &Track) -> Self {
        let predictions = track.predictions();
        let first = track.first();
        let last = track.last();

        let mut total_box = first.bbox;
        let mut best_box = first.bbox;
        let (mut sum_a, mut sum_b) = (Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        for p in predictions {
            total_box = total_box.union_with(&p.bbox);
            if p.bbox.area() > best_box.area() {
                best_box = p.bbox;
            }
            sum_a.x += p.bbox.a.x;
            sum_a.y += p.bbox.a.y;
            sum_b.x += p.bbox.b.x;
            sum_b.y += p.bbox.b.y;
        }

        let n = predictions.len() as f64;
        // summing can round the mean just past the extremes
        let average_box =
            BoundingBox::from_corners(sum_a.x / n, sum_a.y / n, sum_b.x / n, sum_b.y / n)
                .clamped_to(&total_box);

        Self {
            id: track.id(),
            classification: track.classification().to_string(),
            predictions: predictions.to_vec(),
            first_t: first.t,
            last_t: last.t,
            length_t: last.t - first.t,
            first_box: first.bbox,
            last_box: last.bbox,
            total_box,
            average_box,
            best_box,
            movement_vector: first.bbox.center().vector_to(&last.bbox.center()),
        }
    }
}

impl From<&Track> for TrackView {
    fn from(track: &Track) -> Self {
        Self::build(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tracker, TrackerConfig};

    const EPS: f64 = 1e-9;

    /// Three overlapping car boxes drifting down-right, one second apart
    fn three_step_view() -> TrackView {
        let mut tracker = Tracker::new(TrackerConfig {
            inactive_track_prune_s: 10.0,
            ..Default::default()
        });
        let boxes = [
            BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3),
            BoundingBox::from_corners(0.15, 0.15, 0.35, 0.35),
            BoundingBox::from_corners(0.2, 0.2, 0.4, 0.4),
        ];
        let mut id = None;
        for (i, bbox) in boxes.into_iter().enumerate() {
            let t = 100.0 + i as f64;
            let update = tracker.update(Prediction::new("car", bbox, t), t).unwrap();
            id = Some(update.track_id);
        }
        let id = id.unwrap();
        assert_eq!(tracker.track(id).unwrap().len(), 3);
        tracker.view(id).unwrap()
    }

    #[test]
    fn test_times() {
        let view = three_step_view();
        assert_eq!(view.first_t, 100.0);
        assert_eq!(view.last_t, 102.0);
        assert_eq!(view.length_t, 2.0);
    }

    #[test]
    fn test_first_and_last_box() {
        let view = three_step_view();
        assert_eq!(view.first_box, BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3));
        assert_eq!(view.last_box, BoundingBox::from_corners(0.2, 0.2, 0.4, 0.4));
    }

    #[test]
    fn test_total_box() {
        let view = three_step_view();
        assert_eq!(view.total_box, BoundingBox::from_corners(0.1, 0.1, 0.4, 0.4));
    }

    #[test]
    fn test_average_box() {
        let view = three_step_view();
        assert!((view.average_box.a.x - 0.15).abs() < EPS);
        assert!((view.average_box.a.y - 0.15).abs() < EPS);
        assert!((view.average_box.b.x - 0.35).abs() < EPS);
        assert!((view.average_box.b.y - 0.35).abs() < EPS);
        assert!(view.total_box.contains(&view.average_box));
    }

    #[test]
    fn test_average_of_stationary_object_stays_inside_total() {
        let mut tracker = Tracker::new(TrackerConfig::default());
        let bbox = BoundingBox::from_corners(0.173, 0.173, 0.5, 0.5);
        let mut id = None;
        for t in [0.0, 0.1, 0.2] {
            id = Some(tracker.update(Prediction::new("car", bbox, t), t).unwrap().track_id);
        }
        let view = tracker.view(id.unwrap()).unwrap();

        assert_eq!(view.total_box, bbox);
        assert!(view.total_box.contains(&view.average_box));
        assert_eq!(view.average_box, bbox);
    }

    #[test]
    fn test_movement_vector() {
        let view = three_step_view();
        let expected_len = (0.1f64 * 0.1 * 2.0).sqrt();
        assert!((view.movement_vector.length - expected_len).abs() < EPS);
        assert!((view.movement_vector.direction + 45.0).abs() < 1e-6);
        assert!((view.movement_vector.direction360 - 135.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_prediction_view() {
        let mut tracker = Tracker::new(TrackerConfig::default());
        let bbox = BoundingBox::from_corners(0.4, 0.4, 0.6, 0.7);
        let update = tracker.update(Prediction::new("person", bbox, 7.0), 7.0).unwrap();
        let view = tracker.view(update.track_id).unwrap();

        assert_eq!(view.length_t, 0.0);
        assert_eq!(view.first_box, bbox);
        assert_eq!(view.total_box, bbox);
        assert_eq!(view.average_box, bbox);
        assert_eq!(view.best_box, bbox);
        assert_eq!(view.movement_vector.length, 0.0);
    }

    #[test]
    fn test_best_box_is_largest() {
        let mut tracker = Tracker::new(TrackerConfig::default());
        let small = BoundingBox::from_corners(0.4, 0.4, 0.55, 0.55);
        let large = BoundingBox::from_corners(0.38, 0.38, 0.58, 0.58);
        let a = tracker.update(Prediction::new("car", small, 0.0), 0.0).unwrap();
        let b = tracker.update(Prediction::new("car", large, 0.1), 0.1).unwrap();
        assert_eq!(a.track_id, b.track_id);
        assert_eq!(tracker.view(a.track_id).unwrap().best_box, large);
    }

    #[test]
    fn test_view_serializes() {
        let view = three_step_view();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["classification"], "car");
        assert_eq!(json["predictions"].as_array().unwrap().len(), 3);
        assert!(json["movement_vector"]["direction360"].is_number());
    }
}
