//! Control HTTP server
//!
//! Lets recipients of a notification inspect and change the mute window.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use driveway_notify::Notifier;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::clock::StreamClock;
use crate::handlers::{extend_mute, get_mute, health_check, mute, unmute};
use crate::sink::DeliverySink;

/// State shared across handlers
#[derive(Clone)]
pub struct ControlState {
    pub notifier: Notifier,
    pub clock: StreamClock,
    /// Receives a confirmation for every mute change
    pub sink: Arc<dyn DeliverySink>,
}

impl ControlState {
    pub fn new(notifier: Notifier, clock: StreamClock, sink: Arc<dyn DeliverySink>) -> Self {
        Self {
            notifier,
            clock,
            sink,
        }
    }
}

/// Build the control router with all endpoints
pub fn build_router(state: ControlState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/mute", get(get_mute).post(mute))
        .route("/mute/extend", post(extend_mute))
        .route("/unmute", post(unmute))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener
pub async fn serve(listener: TcpListener, state: ControlState) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state)).await
}

/// Start the control server
pub async fn start_server(addr: &str, state: ControlState) -> Result<(), std::io::Error> {
    tracing::info!("Starting control server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}
