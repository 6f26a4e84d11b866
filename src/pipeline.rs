//! The sequential detection path
//!
//! One task owns the tracker and the decision engine. It processes
//! predictions strictly in arrival order and runs the prune tick between
//! them, so the track store never needs a lock. Only the [`Notifier`]
//! handle is shared with the control surface.

use std::time::Duration;

use driveway_notify::{Admission, Decision, DecisionEngine, Delivered, Notifier, SuppressionReason};
use driveway_tracking::{Prediction, TrackId, Tracker, TrackingError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::clock::StreamClock;
use crate::config::{Config, ConfigError};
use crate::sink::DeliverySink;

/// What happened to one prediction
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Malformed or out-of-order; no track was touched
    Rejected(TrackingError),
    Suppressed {
        track_id: TrackId,
        reason: SuppressionReason,
    },
    Delivered(Delivered),
}

/// Counters reported when a run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: u64,
    pub rejected: u64,
    pub suppressed: u64,
    pub delivered: u64,
    pub sink_failures: u64,
}

pub struct Pipeline {
    tracker: Tracker,
    engine: DecisionEngine,
    notifier: Notifier,
    clock: StreamClock,
}

impl Pipeline {
    /// Build the pipeline; fails if the notification rule does not compile
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = DecisionEngine::new(&config.notification_criteria)?;
        if let Some(rule) = engine.rule() {
            info!("Notification rule: {}", rule);
        }
        Ok(Self {
            tracker: Tracker::new(config.tracker.clone()),
            engine,
            notifier: Notifier::new(config.notifier.clone()),
            clock: StreamClock::new(),
        })
    }

    /// Handle for the control surface
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn clock(&self) -> &StreamClock {
        &self.clock
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Track, decide and admit one prediction
    pub fn handle_prediction(&mut self, prediction: Prediction) -> Outcome {
        let now = prediction.t;
        let update = match self.tracker.update(prediction, now) {
            Ok(update) => update,
            Err(e) => {
                warn!("Rejected prediction: {}", e);
                return Outcome::Rejected(e);
            }
        };
        self.clock.observe(now);

        let Some(view) = self.tracker.view(update.track_id) else {
            // update() just created or appended to this track
            error!("{} vanished right after update", update.track_id);
            return Outcome::Rejected(TrackingError::InvalidPrediction(format!(
                "{} is not live",
                update.track_id
            )));
        };

        let decision = match self.engine.evaluate(view) {
            Decision::Notify(decision) => decision,
            Decision::Suppressed(reason) => {
                return Outcome::Suppressed {
                    track_id: update.track_id,
                    reason,
                }
            }
        };

        match self.notifier.admit(decision, now) {
            Admission::Delivered(delivered) => Outcome::Delivered(delivered),
            Admission::Suppressed(reason) => Outcome::Suppressed {
                track_id: update.track_id,
                reason,
            },
        }
    }

    /// Prune idle tracks against stream time
    pub fn tick(&mut self) -> Vec<TrackId> {
        match self.clock.now() {
            Some(now) => self.tracker.prune(now),
            None => Vec::new(),
        }
    }

    /// Process JSON-lines predictions from `input` until it ends.
    ///
    /// Bad lines are logged and skipped; sink failures are logged and do not
    /// stop the run.
    pub async fn run<R>(&mut self, input: R, sink: &dyn DeliverySink) -> std::io::Result<RunStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = RunStats::default();
        let mut lines = input.lines();
        let mut ticker = tokio::time::interval(Duration::from_secs_f64(
            self.tracker.config().prune_tick_s,
        ));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Pipeline started, delivering to {}", sink.name());
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    stats.lines += 1;
                    let prediction = match parse_line(&line) {
                        Ok(Some(prediction)) => prediction,
                        Ok(None) => continue,
                        Err(e) => {
                            warn!("Skipping unparsable line {}: {}", stats.lines, e);
                            stats.rejected += 1;
                            continue;
                        }
                    };
                    match self.handle_prediction(prediction) {
                        Outcome::Rejected(_) => stats.rejected += 1,
                        Outcome::Suppressed { .. } => stats.suppressed += 1,
                        Outcome::Delivered(delivered) => {
                            stats.delivered += 1;
                            if let Err(e) = sink.deliver(&delivered).await {
                                error!("Delivery of {} via {} failed: {}", delivered.track_id, sink.name(), e);
                                stats.sink_failures += 1;
                            }
                        }
                    }
                }
                _ = ticker.tick() => {
                    let pruned = self.tick();
                    if !pruned.is_empty() {
                        debug!("Prune tick removed {} tracks", pruned.len());
                    }
                }
            }
        }

        info!(
            "Input ended: {} lines, {} delivered, {} suppressed, {} rejected",
            stats.lines, stats.delivered, stats.suppressed, stats.rejected
        );
        Ok(stats)
    }
}

/// Parse one input line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<Prediction>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
