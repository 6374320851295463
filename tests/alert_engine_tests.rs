// End-to-end tests for the alert decision engine through its public API.
// Covers the worked debounce/cooldown timeline and the alert invariants.

use sentinel_alert::{AlertEngine, AlertPolicy};
use sentinel_core::{BoundingBox, Detection, WeaponClass};
use std::time::{Duration, Instant};

fn policy(threshold: f32, min_frames: u32, cooldown_secs: u64) -> AlertPolicy {
    AlertPolicy {
        confidence_threshold: threshold,
        min_consecutive_frames: min_frames,
        cooldown: Duration::from_secs(cooldown_secs),
    }
}

fn det(class: WeaponClass, confidence: f32, at: Instant) -> Detection {
    Detection {
        class,
        confidence,
        bbox: BoundingBox::new(20.0, 20.0, 60.0, 60.0),
        observed_at: at,
    }
}

// ============================================================================
// THE WORKED SCENARIO: threshold 0.6, debounce 3 frames, cooldown 5s
// ============================================================================

#[test]
fn test_full_scenario_timeline() {
    let mut engine = AlertEngine::new(policy(0.6, 3, 5));
    let t0 = Instant::now();

    // Frames with pistol confidence [0.7, 0.8, 0.9]: exactly one event,
    // raised by the third frame.
    let mut events = Vec::new();
    for (i, conf) in [0.7f32, 0.8, 0.9].iter().enumerate() {
        let now = t0 + Duration::from_millis(33 * i as u64);
        events.extend(engine.process(&[det(WeaponClass::Pistol, *conf, now)], now));
    }
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].class, WeaponClass::Pistol);

    // A 4s gap with no detections: within cooldown, state stays active.
    let after_4s = t0 + Duration::from_secs(4);
    assert!(engine.process(&[], after_4s).is_empty());
    assert_eq!(engine.active_classes(), vec![WeaponClass::Pistol]);

    // A 6s gap: past cooldown, state resets and detection re-arms.
    let after_6s = t0 + Duration::from_secs(6);
    assert!(engine.process(&[], after_6s).is_empty());
    assert!(engine.active_classes().is_empty());

    // Re-armed: a new qualifying streak raises a second event.
    let mut second_round = Vec::new();
    for i in 0..3u64 {
        let now = after_6s + Duration::from_millis(33 * (i + 1));
        second_round.extend(engine.process(&[det(WeaponClass::Pistol, 0.9, now)], now));
    }
    assert_eq!(second_round.len(), 1);
}

#[test]
fn test_repeated_qualifying_frames_emit_nothing_new() {
    let mut engine = AlertEngine::new(policy(0.6, 3, 5));
    let t0 = Instant::now();

    let mut total = 0;
    for i in 0..100u64 {
        let now = t0 + Duration::from_millis(33 * i);
        total += engine
            .process(&[det(WeaponClass::Pistol, 0.85, now)], now)
            .len();
    }
    assert_eq!(total, 1, "activation must emit exactly once");
}

// ============================================================================
// INVARIANTS
// ============================================================================

#[test]
fn test_malformed_confidence_never_alerts() {
    let mut engine = AlertEngine::new(policy(0.6, 1, 5));
    let t0 = Instant::now();

    for conf in [1.4f32, -0.2, f32::NAN, f32::INFINITY] {
        let events = engine.process(&[det(WeaponClass::Knife, conf, t0)], t0);
        assert!(events.is_empty(), "confidence {conf} must not alert");
    }
    assert_eq!(engine.malformed_dropped(), 4);
    assert!(engine.state(WeaponClass::Knife).is_none());
}

#[test]
fn test_invalid_bbox_never_alerts() {
    let mut engine = AlertEngine::new(policy(0.6, 1, 5));
    let t0 = Instant::now();

    let bad_bbox = Detection {
        class: WeaponClass::Pistol,
        confidence: 0.95,
        bbox: BoundingBox::new(f32::NAN, 0.0, 10.0, 10.0),
        observed_at: t0,
    };
    assert!(engine.process(&[bad_bbox], t0).is_empty());
    assert_eq!(engine.malformed_dropped(), 1);
}

#[test]
fn test_mixed_frame_malformed_does_not_poison_valid() {
    let mut engine = AlertEngine::new(policy(0.6, 1, 5));
    let t0 = Instant::now();

    // A malformed pistol and a valid knife in the same frame: only the
    // knife alerts.
    let events = engine.process(
        &[
            det(WeaponClass::Pistol, 1.4, t0),
            det(WeaponClass::Knife, 0.8, t0),
        ],
        t0,
    );
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].class, WeaponClass::Knife);
}

#[test]
fn test_independent_class_lifecycles() {
    let mut engine = AlertEngine::new(policy(0.6, 2, 5));
    let t0 = Instant::now();

    // Pistol qualifies on every frame, knife only on the first.
    let f1 = engine.process(
        &[
            det(WeaponClass::Pistol, 0.9, t0),
            det(WeaponClass::Knife, 0.9, t0),
        ],
        t0,
    );
    assert!(f1.is_empty());

    let t1 = t0 + Duration::from_millis(33);
    let f2 = engine.process(&[det(WeaponClass::Pistol, 0.9, t1)], t1);
    // Pistol reaches its second consecutive hit and fires; the knife
    // streak broke and must start over.
    assert_eq!(f2.len(), 1);
    assert_eq!(f2[0].class, WeaponClass::Pistol);
    assert!(engine.state(WeaponClass::Knife).is_none());
}

#[test]
fn test_events_only_on_inactive_to_active_transition() {
    let mut engine = AlertEngine::new(policy(0.6, 2, 1));
    let t0 = Instant::now();

    let mut transitions = 0;
    let mut was_active = false;
    for i in 0..200u64 {
        let now = t0 + Duration::from_millis(100 * i);
        // Alternate 5 qualifying frames, then 15 quiet ones (1.5s > 1s
        // cooldown), repeatedly.
        let frame = if i % 20 < 5 {
            vec![det(WeaponClass::Pistol, 0.9, now)]
        } else {
            Vec::new()
        };
        let events = engine.process(&frame, now);

        let is_active = !engine.active_classes().is_empty();
        if is_active && !was_active {
            transitions += 1;
            assert_eq!(events.len(), 1, "transition at frame {i} must emit once");
        } else {
            assert!(events.is_empty(), "no transition at frame {i}, no event");
        }
        was_active = is_active;
    }
    assert!(transitions > 1, "scenario must re-arm at least once");
}
