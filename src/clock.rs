//! Stream clock shared by the detection path and the control surface

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Time in the detection stream's timebase.
///
/// Anchored on the latest prediction timestamp and advanced by wall time
/// elapsed since it arrived, so pruning and mute windows stay consistent
/// with prediction timestamps whether the stream is live or replayed.
#[derive(Debug, Clone, Default)]
pub struct StreamClock {
    anchor: Arc<Mutex<Option<(f64, Instant)>>>,
}

impl StreamClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-anchor on a prediction timestamp; never moves the clock backwards
    pub fn observe(&self, t: f64) {
        let mut anchor = self.anchor.lock().unwrap_or_else(PoisonError::into_inner);
        let arrived = Instant::now();
        let behind = match *anchor {
            Some((at, since)) => t < at + since.elapsed().as_secs_f64(),
            None => false,
        };
        if !behind {
            *anchor = Some((t, arrived));
        }
    }

    /// Current stream time, or `None` before the first prediction
    pub fn now(&self) -> Option<f64> {
        let anchor = self.anchor.lock().unwrap_or_else(PoisonError::into_inner);
        anchor.map(|(at, since)| at + since.elapsed().as_secs_f64())
    }

    /// Stream time, falling back to wall time before the first prediction
    pub fn now_or_wall(&self) -> f64 {
        self.now().unwrap_or_else(unix_now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanchored_clock() {
        let clock = StreamClock::new();
        assert!(clock.now().is_none());
        assert!(clock.now_or_wall() > 1_600_000_000.0);
    }

    #[test]
    fn test_follows_stream_timestamps() {
        let clock = StreamClock::new();
        clock.observe(100.0);
        let now = clock.now().unwrap();
        assert!((100.0..101.0).contains(&now));

        clock.observe(250.0);
        assert!(clock.now().unwrap() >= 250.0);
    }

    #[test]
    fn test_never_moves_backwards() {
        let clock = StreamClock::new();
        clock.observe(500.0);
        clock.observe(400.0);
        assert!(clock.now().unwrap() >= 500.0);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = StreamClock::new();
        let control = clock.clone();
        clock.observe(42.0);
        assert!(control.now().unwrap() >= 42.0);
    }
}
