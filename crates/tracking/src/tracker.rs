//! Prediction-to-track association

use tracing::{debug, info};

use crate::track::TrackStore;
use crate::{Prediction, Track, TrackId, TrackView, TrackerConfig, TrackingError};

/// What [`Tracker::update`] did with a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// The prediction seeded a new track
    Created,
    /// The prediction was appended to an existing track
    Appended,
}

/// Result of associating one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackUpdate {
    pub track_id: TrackId,
    pub kind: UpdateKind,
}

/// Associates predictions with tracks and prunes idle tracks.
///
/// Predictions must be fed one at a time in arrival order.
pub struct Tracker {
    config: TrackerConfig,
    store: TrackStore,
}

impl Tracker {
    /// Create new tracker
    pub fn new(config: TrackerConfig) -> Self {
        info!("Creating tracker with config: {:?}", config);
        Self {
            config,
            store: TrackStore::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Associate `prediction` with the best matching track, or start a new one.
    ///
    /// Idle tracks are pruned against `now` first so that new motion is never
    /// attached to an object that has already left. A malformed prediction is
    /// rejected without touching any track.
    pub fn update(
        &mut self,
        prediction: Prediction,
        now: f64,
    ) -> Result<TrackUpdate, TrackingError> {
        prediction.validate()?;
        self.prune(now);

        match self.best_match(&prediction) {
            Some((track_id, overlap)) => {
                debug!(
                    "Adding {} prediction at t={} to {} (overlap {:.3})",
                    prediction.classification, prediction.t, track_id, overlap
                );
                self.store.append(track_id, prediction)?;
                Ok(TrackUpdate {
                    track_id,
                    kind: UpdateKind::Appended,
                })
            }
            None => {
                let classification = prediction.classification.clone();
                let track_id = self.store.create(prediction);
                debug!("Created {} for {} prediction", track_id, classification);
                Ok(TrackUpdate {
                    track_id,
                    kind: UpdateKind::Created,
                })
            }
        }
    }

    /// Same-classification track whose last-two-box average overlaps the
    /// prediction the most, at or above the configured minimum. Ties go to
    /// the most recently updated track.
    fn best_match(&self, prediction: &Prediction) -> Option<(TrackId, f64)> {
        let min_overlap = self.config.track_connect_min_overlap;
        let mut best: Option<(&Track, f64)> = None;

        for track in self
            .store
            .iter()
            .filter(|t| t.classification() == prediction.classification)
        {
            let overlap = prediction.bbox.overlap_ratio(&track.last_two_average());
            if overlap < min_overlap {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, current_overlap)) => {
                    overlap > current_overlap
                        || (overlap == current_overlap && track.touched() > current.touched())
                }
            };
            if better {
                best = Some((track, overlap));
            }
        }

        best.map(|(track, overlap)| (track.id(), overlap))
    }

    /// Drop every track idle for longer than `inactive_track_prune_s`.
    ///
    /// Runs on each update and on a periodic tick, so tracks are reclaimed
    /// even when detections stop arriving.
    pub fn prune(&mut self, now: f64) -> Vec<TrackId> {
        let pruned = self.store.prune(now, self.config.inactive_track_prune_s);
        if !pruned.is_empty() {
            debug!("Pruned {} idle tracks: {:?}", pruned.len(), pruned);
        }
        pruned
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.store.get(id)
    }

    /// Read-only view of a live track
    pub fn view(&self, id: TrackId) -> Option<TrackView> {
        self.store.get(id).map(TrackView::build)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.store.iter()
    }

    pub fn active_tracks(&self) -> usize {
        self.store.len()
    }
}
