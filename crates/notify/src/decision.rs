//! Per-update notification criteria

use std::collections::{HashMap, HashSet};
use std::fmt;

use driveway_rules::{CompileError, Rule};
use driveway_tracking::{TrackId, TrackView};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which track updates qualify for a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CriteriaConfig {
    /// When non-empty, only these classifications can notify
    pub classification_allowlist: Vec<String>,
    pub classification_blocklist: Vec<String>,
    /// Minimum `length_t`, in seconds
    pub min_track_length_s: f64,
    pub min_track_length_s_per_classification: HashMap<String, f64>,
    /// Rule expression evaluated against `track`
    pub track_cel: Option<String>,
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        Self {
            classification_allowlist: Vec::new(),
            classification_blocklist: Vec::new(),
            min_track_length_s: 1.0,
            min_track_length_s_per_classification: HashMap::new(),
            track_cel: None,
        }
    }
}

/// Why an update, or a decision, did not turn into a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    NotAllowlisted,
    Blocklisted,
    TooShort,
    RuleFalse,
    Muted,
    Debounced,
}

impl SuppressionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressionReason::NotAllowlisted => "not_allowlisted",
            SuppressionReason::Blocklisted => "blocklisted",
            SuppressionReason::TooShort => "too_short",
            SuppressionReason::RuleFalse => "rule_false",
            SuppressionReason::Muted => "muted",
            SuppressionReason::Debounced => "debounced",
        }
    }
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A track update that met every criterion
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyDecision {
    pub track_id: TrackId,
    pub classification: String,
    pub view: TrackView,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Notify(NotifyDecision),
    Suppressed(SuppressionReason),
}

impl Decision {
    pub fn is_notify(&self) -> bool {
        matches!(self, Decision::Notify(_))
    }
}

/// Applies the criteria to each updated track view. Stateless per call.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    allowlist: HashSet<String>,
    blocklist: HashSet<String>,
    min_track_length_s: f64,
    min_track_length_s_per_classification: HashMap<String, f64>,
    rule: Option<Rule>,
}

impl DecisionEngine {
    /// Build the engine, compiling `track_cel` up front
    pub fn new(criteria: &CriteriaConfig) -> Result<Self, CompileError> {
        let rule = criteria
            .track_cel
            .as_deref()
            .map(Rule::compile)
            .transpose()?;

        Ok(Self {
            allowlist: criteria.classification_allowlist.iter().cloned().collect(),
            blocklist: criteria.classification_blocklist.iter().cloned().collect(),
            min_track_length_s: criteria.min_track_length_s,
            min_track_length_s_per_classification: criteria
                .min_track_length_s_per_classification
                .clone(),
            rule,
        })
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    fn min_length_for(&self, classification: &str) -> f64 {
        self.min_track_length_s_per_classification
            .get(classification)
            .copied()
            .unwrap_or(self.min_track_length_s)
    }

    /// Run the checks in order, cheapest first, stopping at the first failure
    pub fn evaluate(&self, view: TrackView) -> Decision {
        let reason = self.check(&view);
        match reason {
            Some(reason) => {
                debug!(
                    "{} ({}) suppressed: {}",
                    view.id, view.classification, reason
                );
                Decision::Suppressed(reason)
            }
            None => Decision::Notify(NotifyDecision {
                track_id: view.id,
                classification: view.classification.clone(),
                view,
            }),
        }
    }

    fn check(&self, view: &TrackView) -> Option<SuppressionReason> {
        if !self.allowlist.is_empty() && !self.allowlist.contains(&view.classification) {
            return Some(SuppressionReason::NotAllowlisted);
        }
        if self.blocklist.contains(&view.classification) {
            return Some(SuppressionReason::Blocklisted);
        }
        if view.length_t < self.min_length_for(&view.classification) {
            return Some(SuppressionReason::TooShort);
        }
        if let Some(rule) = &self.rule {
            match rule.evaluate(view) {
                Ok(true) => {}
                Ok(false) => return Some(SuppressionReason::RuleFalse),
                Err(e) => {
                    warn!("Rule '{}' failed on {}: {}", rule, view.id, e);
                    return Some(SuppressionReason::RuleFalse);
                }
            }
        }
        None
    }
}
