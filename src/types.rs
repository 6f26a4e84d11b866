//! Control API request and response types

use driveway_notify::MuteState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `POST /mute` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuteRequest {
    /// Key of a recent delivery; a missing key is refused like a bad one
    #[serde(default)]
    pub key: String,
    /// Mute duration in seconds; below 1 unmutes, omitted uses the default
    #[serde(default)]
    pub s: Option<f64>,
}

/// `POST /mute/extend` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendRequest {
    #[serde(default)]
    pub key: String,
    pub s: f64,
}

/// `POST /unmute` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmuteRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuteResponse {
    pub status: String,
    pub mute: MuteState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
