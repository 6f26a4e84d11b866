//! HTTP handlers for the control endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use driveway_notify::{Feedback, MuteState};
use tracing::{info, warn};

use crate::server::ControlState;
use crate::types::{
    ErrorResponse, ExtendRequest, HealthResponse, MuteRequest, MuteResponse, UnmuteRequest,
};

/// Longest mute a single command may set or add, one year
pub const MAX_MUTE_S: f64 = 366.0 * 24.0 * 3600.0;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn ok(mute: MuteState) -> Json<MuteResponse> {
    Json(MuteResponse {
        status: "ok".to_string(),
        mute,
    })
}

/// Unwrap a JSON body, mapping any rejection to 400
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("Malformed control request: {}", rejection.body_text());
        api_error(StatusCode::BAD_REQUEST, rejection.body_text())
    })
}

/// Only recipients of a recent notification may change the mute state
fn authorize(state: &ControlState, key: &str, now: f64) -> Result<(), ApiError> {
    if key.is_empty() {
        return Err(api_error(StatusCode::FORBIDDEN, "missing 'key' field"));
    }
    if !state.notifier.knows_key(key, now) {
        warn!("Control request with unknown or expired key");
        return Err(api_error(StatusCode::FORBIDDEN, "bad key"));
    }
    Ok(())
}

/// Confirm a mute change to recipients; a failed send does not fail the command
async fn confirm(state: &ControlState, key: &str, mute: MuteState) {
    let feedback = Feedback::new(key, mute);
    if let Err(e) = state.sink.feedback(&feedback).await {
        warn!("Mute confirmation via {} failed: {}", state.sink.name(), e);
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_mute(State(state): State<ControlState>) -> Json<MuteResponse> {
    ok(state.notifier.mute_state(state.clock.now_or_wall()))
}

/// Mute for `s` seconds; `s < 1` unmutes
pub async fn mute(
    State(state): State<ControlState>,
    payload: Result<Json<MuteRequest>, JsonRejection>,
) -> Result<Json<MuteResponse>, ApiError> {
    let request = body(payload)?;
    let now = state.clock.now_or_wall();
    authorize(&state, &request.key, now)?;

    let seconds = request
        .s
        .unwrap_or(state.notifier.config().mute_default_s);
    if !seconds.is_finite() || seconds > MAX_MUTE_S {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'s' must be a number of at most {MAX_MUTE_S} seconds"),
        ));
    }
    let mute = if seconds < 1.0 {
        state.notifier.unmute()
    } else {
        state.notifier.mute(seconds, now)
    };
    info!("Mute state changed via control API: {:?}", mute);
    confirm(&state, &request.key, mute).await;
    Ok(ok(mute))
}

pub async fn extend_mute(
    State(state): State<ControlState>,
    payload: Result<Json<ExtendRequest>, JsonRejection>,
) -> Result<Json<MuteResponse>, ApiError> {
    let request = body(payload)?;
    let now = state.clock.now_or_wall();
    authorize(&state, &request.key, now)?;

    if !request.s.is_finite() || request.s < 0.0 || request.s > MAX_MUTE_S {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'s' must be between 0 and {MAX_MUTE_S} seconds"),
        ));
    }
    let mute = state.notifier.extend(request.s, now);
    confirm(&state, &request.key, mute).await;
    Ok(ok(mute))
}

pub async fn unmute(
    State(state): State<ControlState>,
    payload: Result<Json<UnmuteRequest>, JsonRejection>,
) -> Result<Json<MuteResponse>, ApiError> {
    let request = body(payload)?;
    authorize(&state, &request.key, state.clock.now_or_wall())?;
    let mute = state.notifier.unmute();
    confirm(&state, &request.key, mute).await;
    Ok(ok(mute))
}
