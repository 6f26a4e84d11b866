//! Driveway monitor
//!
//! Turns a stream of per-frame object detections into "something arrived"
//! notifications: predictions are grouped into tracks, each updated track
//! is checked against the configured criteria and rule, and qualifying
//! tracks pass mute and debounce gating before reaching a delivery sink.
//! A small HTTP control server lets notification recipients mute further
//! alerts.

pub mod clock;
pub mod config;
pub mod handlers;
pub mod pipeline;
pub mod server;
pub mod sink;
pub mod types;

pub use clock::StreamClock;
pub use config::{Config, ConfigError, WebConfig};
pub use handlers::MAX_MUTE_S;
pub use pipeline::{parse_line, Outcome, Pipeline, RunStats};
pub use server::{build_router, serve, start_server, ControlState};
pub use sink::{DeliveryMessage, DeliverySink, MemorySink, SinkError, StdoutSink};
pub use types::*;
