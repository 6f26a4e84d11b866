//! Delivery sinks: where admitted notifications go

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use driveway_notify::{Delivered, Feedback, FeedbackKind, MuteState, Priority};
use driveway_tracking::{TrackId, TrackView};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to encode delivery: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Failed to write delivery: {0}")]
    Io(#[from] std::io::Error),
}

/// Hands admitted notifications and mute confirmations to the delivery
/// collaborator
#[async_trait]
pub trait DeliverySink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, delivered: &Delivered) -> Result<(), SinkError>;

    async fn feedback(&self, feedback: &Feedback) -> Result<(), SinkError>;
}

/// Wire shape of one message to recipients
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryMessage<'a> {
    /// Something arrived
    Object {
        key: &'a str,
        title: String,
        tags: &'static str,
        priority: Priority,
        classification: &'a str,
        track_id: TrackId,
        t: f64,
        view: &'a TrackView,
    },
    /// A control command changed the mute window
    Feedback {
        key: &'a str,
        title: &'static str,
        message: String,
        tags: &'static str,
        priority: Priority,
        kind: FeedbackKind,
        mute: MuteState,
    },
}

impl<'a> From<&'a Delivered> for DeliveryMessage<'a> {
    fn from(d: &'a Delivered) -> Self {
        Self::Object {
            key: &d.key,
            title: d.title(),
            tags: d.tag(),
            priority: d.priority,
            classification: &d.classification,
            track_id: d.track_id,
            t: d.t,
            view: &d.view,
        }
    }
}

impl<'a> From<&'a Feedback> for DeliveryMessage<'a> {
    fn from(f: &'a Feedback) -> Self {
        Self::Feedback {
            key: &f.key,
            title: f.title(),
            message: f.message(),
            tags: f.tag(),
            priority: f.priority(),
            kind: f.kind,
            mute: f.mute,
        }
    }
}

async fn write_line(message: &DeliveryMessage<'_>) -> Result<(), SinkError> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}

/// Prints one JSON line per delivery
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl DeliverySink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(&self, delivered: &Delivered) -> Result<(), SinkError> {
        write_line(&DeliveryMessage::from(delivered)).await
    }

    async fn feedback(&self, feedback: &Feedback) -> Result<(), SinkError> {
        write_line(&DeliveryMessage::from(feedback)).await
    }
}

/// Keeps deliveries and feedback in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    delivered: Arc<Mutex<Vec<Delivered>>>,
    feedback: Arc<Mutex<Vec<Feedback>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn feedback_sent(&self) -> Vec<Feedback> {
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DeliverySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, delivered: &Delivered) -> Result<(), SinkError> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delivered.clone());
        Ok(())
    }

    async fn feedback(&self, feedback: &Feedback) -> Result<(), SinkError> {
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(feedback.clone());
        Ok(())
    }
}
