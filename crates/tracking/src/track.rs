//! Tracks and the store that owns them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, Prediction, TrackingError};

/// Opaque track identifier, unique for the lifetime of a [`crate::Tracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(u64);

impl TrackId {
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trk-{}", self.0)
    }
}

/// A time-ordered sequence of predictions believed to be one object.
///
/// A track always holds at least one prediction, never changes
/// classification, and its prediction timestamps never decrease.
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    classification: String,
    predictions: Vec<Prediction>,
    /// Store sequence number of the last append, used to prefer the most
    /// recently updated track when overlaps tie
    touched: u64,
}

impl Track {
    fn new(id: TrackId, prediction: Prediction, touched: u64) -> Self {
        Self {
            id,
            classification: prediction.classification.clone(),
            predictions: vec![prediction],
            touched,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn classification(&self) -> &str {
        &self.classification
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn first(&self) -> &Prediction {
        &self.predictions[0]
    }

    pub fn last(&self) -> &Prediction {
        &self.predictions[self.predictions.len() - 1]
    }

    /// Timestamp of the latest prediction
    pub fn last_seen(&self) -> f64 {
        self.last().t
    }

    pub(crate) fn touched(&self) -> u64 {
        self.touched
    }

    /// Average of the last two boxes, or the last box when the track has
    /// only one prediction. New predictions are matched against this.
    pub fn last_two_average(&self) -> BoundingBox {
        let last = self.last().bbox;
        match self.predictions.len() {
            0 | 1 => last,
            n => self.predictions[n - 2].bbox.average_with(&last),
        }
    }

    fn append(&mut self, prediction: Prediction, touched: u64) -> Result<(), TrackingError> {
        if prediction.classification != self.classification {
            return Err(TrackingError::ClassificationMismatch {
                track_id: self.id,
                expected: self.classification.clone(),
                got: prediction.classification,
            });
        }
        if prediction.t < self.last_seen() {
            return Err(TrackingError::OutOfOrder {
                track_id: self.id,
                last_seen: self.last_seen(),
                t: prediction.t,
            });
        }
        self.predictions.push(prediction);
        self.touched = touched;
        Ok(())
    }
}

/// Owns every live track. Only the tracker mutates it.
#[derive(Debug)]
pub(crate) struct TrackStore {
    tracks: Vec<Track>,
    next_id: u64,
    sequence: u64,
}

impl TrackStore {
    pub(crate) fn new() -> Self {
        Self {
            tracks: Vec::with_capacity(16),
            next_id: 1,
            sequence: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub(crate) fn create(&mut self, prediction: Prediction) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        let touched = self.tick();
        self.tracks.push(Track::new(id, prediction, touched));
        id
    }

    pub(crate) fn append(
        &mut self,
        id: TrackId,
        prediction: Prediction,
    ) -> Result<(), TrackingError> {
        let touched = self.tick();
        match self.tracks.iter_mut().find(|t| t.id == id) {
            Some(track) => track.append(prediction, touched),
            None => Err(TrackingError::InvalidPrediction(format!(
                "track {id} is no longer active"
            ))),
        }
    }

    /// Remove tracks idle for longer than `max_idle_s`; returns their ids
    pub(crate) fn prune(&mut self, now: f64, max_idle_s: f64) -> Vec<TrackId> {
        let mut pruned = Vec::new();
        self.tracks.retain(|track| {
            let keep = now - track.last_seen() <= max_idle_s;
            if !keep {
                pruned.push(track.id);
            }
            keep
        });
        pruned
    }

    pub(crate) fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(t: f64, x: f64) -> Prediction {
        Prediction::new("car", BoundingBox::from_corners(x, 0.1, x + 0.2, 0.3), t)
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let mut store = TrackStore::new();
        let a = store.create(pred(0.0, 0.1));
        let b = store.create(pred(0.0, 0.5));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a).unwrap().len(), 1);
    }

    #[test]
    fn test_append_rejects_out_of_order() {
        let mut store = TrackStore::new();
        let id = store.create(pred(5.0, 0.1));
        let err = store.append(id, pred(4.0, 0.1)).unwrap_err();
        assert!(matches!(err, TrackingError::OutOfOrder { .. }));
        assert_eq!(store.get(id).unwrap().len(), 1);

        // equal timestamps are allowed
        store.append(id, pred(5.0, 0.12)).unwrap();
        assert_eq!(store.get(id).unwrap().len(), 2);
    }

    #[test]
    fn test_append_rejects_other_classification() {
        let mut store = TrackStore::new();
        let id = store.create(pred(0.0, 0.1));
        let person = Prediction::new("person", BoundingBox::from_corners(0.1, 0.1, 0.3, 0.3), 1.0);
        assert!(matches!(
            store.append(id, person),
            Err(TrackingError::ClassificationMismatch { .. })
        ));
    }

    #[test]
    fn test_last_two_average() {
        let mut store = TrackStore::new();
        let id = store.create(pred(0.0, 0.1));
        assert_eq!(
            store.get(id).unwrap().last_two_average(),
            pred(0.0, 0.1).bbox
        );

        store.append(id, pred(1.0, 0.2)).unwrap();
        store.append(id, pred(2.0, 0.3)).unwrap();
        let avg = store.get(id).unwrap().last_two_average();
        assert!((avg.a.x - 0.25).abs() < 1e-9);
        assert!((avg.b.x - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_prune_boundary() {
        let mut store = TrackStore::new();
        let id = store.create(pred(10.0, 0.1));

        assert!(store.prune(11.0, 1.0).is_empty());
        assert_eq!(store.len(), 1);

        assert_eq!(store.prune(11.001, 1.0), vec![id]);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_track_id_display() {
        let mut store = TrackStore::new();
        let id = store.create(pred(0.0, 0.1));
        assert_eq!(id.to_string(), "trk-1");
        assert_eq!(id.as_u64(), 1);
    }
}
