//! Integration tests for the decision and admission path

use driveway_notify::{
    Admission, CriteriaConfig, Decision, DecisionEngine, MuteState, Notifier, NotifierConfig,
    Priority, SuppressionReason,
};
use driveway_tracking::{BoundingBox, Prediction, Tracker, TrackerConfig};

struct Harness {
    tracker: Tracker,
    engine: DecisionEngine,
    notifier: Notifier,
}

impl Harness {
    fn new(criteria: CriteriaConfig, notifier: NotifierConfig) -> Self {
        Self {
            tracker: Tracker::new(TrackerConfig {
                inactive_track_prune_s: 5.0,
                ..Default::default()
            }),
            engine: DecisionEngine::new(&criteria).unwrap(),
            notifier: Notifier::new(notifier),
        }
    }

    /// Feed one prediction through tracking, decision and admission
    fn feed(&mut self, class: &str, ax: f64, ay: f64, bx: f64, by: f64, t: f64) -> Result<Admission, SuppressionReason> {
        let p = Prediction::new(class, BoundingBox::from_corners(ax, ay, bx, by), t);
        let id = self.tracker.update(p, t).unwrap().track_id;
        let view = self.tracker.view(id).unwrap();
        match self.engine.evaluate(view) {
            Decision::Notify(decision) => Ok(self.notifier.admit(decision, t)),
            Decision::Suppressed(reason) => Err(reason),
        }
    }
}

#[test]
fn test_car_driving_up_the_driveway() {
    let mut h = Harness::new(
        CriteriaConfig {
            classification_allowlist: vec!["car".into(), "person".into()],
            min_track_length_s: 1.0,
            track_cel: Some(
                "track.last_box.b.y > 0.4 && track.movement_vector.length > 0.05".into(),
            ),
            ..Default::default()
        },
        NotifierConfig {
            debounce_threshold_s: 30.0,
            priorities: [("car".to_string(), Priority::High)].into_iter().collect(),
            ..Default::default()
        },
    );

    // too short to qualify yet
    assert_eq!(
        h.feed("car", 0.30, 0.20, 0.50, 0.35, 0.0).unwrap_err(),
        SuppressionReason::TooShort
    );
    // long enough, but has not come down the frame far enough
    assert_eq!(
        h.feed("car", 0.31, 0.25, 0.51, 0.40, 1.0).unwrap_err(),
        SuppressionReason::RuleFalse
    );
    // qualifies
    let admission = h.feed("car", 0.32, 0.30, 0.52, 0.45, 2.0).unwrap();
    let delivered = match admission {
        Admission::Delivered(d) => d,
        other => panic!("expected delivery, got {other:?}"),
    };
    assert_eq!(delivered.title(), "Car arrived in driveway");
    assert_eq!(delivered.priority, Priority::High);
    assert_eq!(delivered.view.predictions.len(), 3);

    // re-evaluated on the next update, and debounced
    assert_eq!(
        h.feed("car", 0.33, 0.35, 0.53, 0.50, 3.0).unwrap(),
        Admission::Suppressed(SuppressionReason::Debounced)
    );
}

#[test]
fn test_blocklisted_class_never_reaches_notifier() {
    let mut h = Harness::new(
        CriteriaConfig {
            classification_blocklist: vec!["cat".into()],
            min_track_length_s: 0.0,
            ..Default::default()
        },
        NotifierConfig::default(),
    );
    assert_eq!(
        h.feed("cat", 0.1, 0.1, 0.2, 0.2, 0.0).unwrap_err(),
        SuppressionReason::Blocklisted
    );
    assert_eq!(h.notifier.last_delivery("cat"), None);
}

#[test]
fn test_mute_from_control_path_with_delivery_key() {
    let mut h = Harness::new(
        CriteriaConfig {
            min_track_length_s: 0.0,
            ..Default::default()
        },
        NotifierConfig {
            debounce_threshold_s: 0.0,
            ..Default::default()
        },
    );
    let delivered = match h.feed("person", 0.4, 0.4, 0.5, 0.7, 100.0).unwrap() {
        Admission::Delivered(d) => d,
        other => panic!("expected delivery, got {other:?}"),
    };

    // the control surface holds a clone of the handle
    let control = h.notifier.clone();
    assert!(control.knows_key(&delivered.key, 101.0));
    assert_eq!(control.mute(60.0, 101.0), MuteState::Muted { until: 161.0 });

    assert_eq!(
        h.feed("person", 0.4, 0.4, 0.5, 0.7, 102.0).unwrap(),
        Admission::Suppressed(SuppressionReason::Muted)
    );
    control.unmute();
    assert!(matches!(
        h.feed("person", 0.4, 0.4, 0.5, 0.7, 103.0).unwrap(),
        Admission::Delivered(_)
    ));
}
