//! Mute and debounce gating shared between the detection path and the
//! control surface.
//!
//! All mutable state lives behind one mutex and every admission is a single
//! read-check-write under that lock, so two concurrent admissions can never
//! both pass the debounce gate for the same classification.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Delivered, NotifierConfig, NotifyDecision, Priority, SuppressionReason};

/// Current mute window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MuteState {
    Unmuted,
    Muted { until: f64 },
}

impl MuteState {
    pub fn is_muted(&self) -> bool {
        matches!(self, MuteState::Muted { .. })
    }
}

/// Result of [`Notifier::admit`]
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Delivered(Delivered),
    Suppressed(SuppressionReason),
}

#[derive(Debug)]
struct NotifierState {
    mute: MuteState,
    /// classification -> time of its last delivery
    ledger: HashMap<String, f64>,
    /// delivery key -> expiry time
    records: HashMap<String, f64>,
}

impl NotifierState {
    /// Lapse an expired mute window
    fn refresh_mute(&mut self, now: f64) -> MuteState {
        if let MuteState::Muted { until } = self.mute {
            if now >= until {
                info!("Mute window ended at {}", until);
                self.mute = MuteState::Unmuted;
            }
        }
        self.mute
    }
}

/// Cheaply cloneable handle to the notifier state
#[derive(Debug, Clone)]
pub struct Notifier {
    config: Arc<NotifierConfig>,
    state: Arc<Mutex<NotifierState>>,
}

impl Notifier {
    pub fn new(config: NotifierConfig) -> Self {
        info!(
            "Creating notifier: debounce {}s, default priority {}",
            config.debounce_threshold_s, config.default_priority
        );
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(NotifierState {
                mute: MuteState::Unmuted,
                ledger: HashMap::new(),
                records: HashMap::new(),
            })),
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    // Every critical section leaves the state consistent, so a panic in
    // another holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, NotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn priority_for(&self, classification: &str) -> Priority {
        self.config
            .priorities
            .get(classification)
            .copied()
            .unwrap_or(self.config.default_priority)
    }

    /// Gate a decision on mute and debounce; on success record the delivery.
    pub fn admit(&self, decision: NotifyDecision, now: f64) -> Admission {
        let mut state = self.lock();

        if let MuteState::Muted { until } = state.refresh_mute(now) {
            debug!(
                "{} ({}) suppressed: muted until {}",
                decision.track_id, decision.classification, until
            );
            return Admission::Suppressed(SuppressionReason::Muted);
        }

        if let Some(last) = state.ledger.get(&decision.classification) {
            if now - last < self.config.debounce_threshold_s {
                debug!(
                    "{} ({}) suppressed: debounced, last delivery at {}",
                    decision.track_id, decision.classification, last
                );
                return Admission::Suppressed(SuppressionReason::Debounced);
            }
        }

        state.ledger.insert(decision.classification.clone(), now);
        state.records.retain(|_, expires_at| *expires_at >= now);
        let key = Uuid::new_v4().to_string();
        state
            .records
            .insert(key.clone(), now + self.config.record_ttl_s);
        drop(state);

        let priority = self.priority_for(&decision.classification);
        info!(
            "Delivering {} for {} at priority {}",
            decision.classification, decision.track_id, priority
        );
        Admission::Delivered(Delivered {
            key,
            track_id: decision.track_id,
            classification: decision.classification,
            priority,
            t: now,
            view: decision.view,
        })
    }

    /// Mute for `duration_s` from `now`, replacing any current window
    pub fn mute(&self, duration_s: f64, now: f64) -> MuteState {
        let mut state = self.lock();
        state.mute = MuteState::Muted {
            until: now + duration_s,
        };
        info!("Muted for {}s (until {})", duration_s, now + duration_s);
        state.mute
    }

    /// Push the end of the current mute window out by `duration_s`.
    /// When not muted this starts a window at `now`.
    pub fn extend(&self, duration_s: f64, now: f64) -> MuteState {
        let mut state = self.lock();
        let until = match state.refresh_mute(now) {
            MuteState::Muted { until } => until + duration_s,
            MuteState::Unmuted => now + duration_s,
        };
        state.mute = MuteState::Muted { until };
        info!("Mute extended by {}s (until {})", duration_s, until);
        state.mute
    }

    pub fn unmute(&self) -> MuteState {
        let mut state = self.lock();
        state.mute = MuteState::Unmuted;
        info!("Unmuted");
        state.mute
    }

    pub fn mute_state(&self, now: f64) -> MuteState {
        self.lock().refresh_mute(now)
    }

    /// Whether `key` belongs to an unexpired delivery
    pub fn knows_key(&self, key: &str, now: f64) -> bool {
        self.lock()
            .records
            .get(key)
            .is_some_and(|expires_at| *expires_at >= now)
    }

    /// Time of the last delivery for `classification`
    pub fn last_delivery(&self, classification: &str) -> Option<f64> {
        self.lock().ledger.get(classification).copied()
    }
}
