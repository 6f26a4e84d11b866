//! Admitted notifications, ready for the delivery collaborator

use driveway_tracking::{TrackId, TrackView};
use serde::Serialize;

use crate::{MuteState, Priority};

/// A notification that passed mute and debounce gating
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivered {
    /// Opaque key the recipient presents to mute further notifications
    pub key: String,
    pub track_id: TrackId,
    pub classification: String,
    pub priority: Priority,
    /// Admission time, in seconds
    pub t: f64,
    pub view: TrackView,
}

impl Delivered {
    /// e.g. "Car arrived in driveway"; only the first letter is upper case
    pub fn title(&self) -> String {
        let text = format!("{} arrived in driveway", self.classification.to_lowercase());
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Emoji shortcode shown next to the title
    pub fn tag(&self) -> &'static str {
        match self.classification.as_str() {
            "car" => "blue_car",
            "truck" => "truck",
            "person" => "walking",
            _ => "camera_flash",
        }
    }
}

/// What a control command did to the mute window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Muted,
    Unmuted,
}

/// Confirmation sent to recipients after the mute window changes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    /// Key the command was authorized with
    pub key: String,
    pub mute: MuteState,
}

impl Feedback {
    pub fn new(key: impl Into<String>, mute: MuteState) -> Self {
        let kind = if mute.is_muted() {
            FeedbackKind::Muted
        } else {
            FeedbackKind::Unmuted
        };
        Self {
            kind,
            key: key.into(),
            mute,
        }
    }

    pub fn title(&self) -> &'static str {
        "driveway-monitor"
    }

    pub fn message(&self) -> String {
        match self.mute {
            MuteState::Muted { until } => format!("Notifications muted until t={until:.0}."),
            MuteState::Unmuted => "Notifications unmuted.".to_string(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self.kind {
            FeedbackKind::Muted => "mute",
            FeedbackKind::Unmuted => "loud_sound",
        }
    }

    /// Mute confirmations stay quiet; unmute ones use the default level
    pub fn priority(&self) -> Priority {
        match self.kind {
            FeedbackKind::Muted => Priority::Min,
            FeedbackKind::Unmuted => Priority::Default,
        }
    }
}
