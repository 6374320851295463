// Property tests for the alert decision engine.
//
// The central property from the design: an alert event is emitted if and
// only if a class accumulates `min_consecutive_frames` qualifying
// detections consecutively, once per activation.

use proptest::prelude::*;
use sentinel_alert::{AlertEngine, AlertPolicy};
use sentinel_core::{BoundingBox, Detection, WeaponClass};
use std::time::{Duration, Instant};

const THRESHOLD: f32 = 0.6;
const MIN_FRAMES: u32 = 3;

fn class_of(index: u8) -> WeaponClass {
    if index == 0 {
        WeaponClass::Pistol
    } else {
        WeaponClass::Knife
    }
}

fn det(class: WeaponClass, confidence: f32, at: Instant) -> Detection {
    Detection {
        class,
        confidence,
        bbox: BoundingBox::new(5.0, 5.0, 30.0, 30.0),
        observed_at: at,
    }
}

/// Reference count: maximal runs of qualifying frames with length >=
/// MIN_FRAMES, per class. With a zero cooldown and advancing timestamps,
/// every such run activates exactly once and every break clears the state.
fn expected_events(frames: &[Vec<(u8, f32)>], class: WeaponClass) -> usize {
    let mut runs = 0usize;
    let mut current = 0u32;
    for frame in frames {
        let qualifies = frame
            .iter()
            .any(|(idx, conf)| class_of(*idx) == class && *conf >= THRESHOLD);
        if qualifies {
            current += 1;
            if current == MIN_FRAMES {
                runs += 1;
            }
        } else {
            current = 0;
        }
    }
    runs
}

fn run_engine(frames: &[Vec<(u8, f32)>], cooldown: Duration) -> Vec<WeaponClass> {
    let mut engine = AlertEngine::new(AlertPolicy {
        confidence_threshold: THRESHOLD,
        min_consecutive_frames: MIN_FRAMES,
        cooldown,
    });

    let t0 = Instant::now();
    let mut emitted = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        let now = t0 + Duration::from_millis(100 * i as u64);
        let detections: Vec<Detection> = frame
            .iter()
            .map(|(idx, conf)| det(class_of(*idx), *conf, now))
            .collect();
        for event in engine.process(&detections, now) {
            emitted.push(event.class);
        }

        // Invariant: never more than one active state per class.
        let active = engine.active_classes();
        let mut deduped = active.clone();
        deduped.dedup();
        assert_eq!(active, deduped);
    }
    emitted
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // With zero cooldown, one event per qualifying run of length >=
    // MIN_FRAMES, for each class independently.
    #[test]
    fn prop_events_match_qualifying_runs(
        frames in prop::collection::vec(
            prop::collection::vec((0u8..2, 0.0f32..1.0), 0..3),
            0..60,
        )
    ) {
        let emitted = run_engine(&frames, Duration::ZERO);
        for class in WeaponClass::ALL {
            let got = emitted.iter().filter(|c| **c == class).count();
            let want = expected_events(&frames, class);
            prop_assert_eq!(got, want, "class {}", class);
        }
    }

    // With a cooldown longer than the whole sequence, a class can activate
    // at most once no matter how the stream flickers.
    #[test]
    fn prop_long_cooldown_caps_events_at_one(
        frames in prop::collection::vec(
            prop::collection::vec((0u8..2, 0.0f32..1.0), 0..3),
            0..60,
        )
    ) {
        let emitted = run_engine(&frames, Duration::from_secs(3600));
        for class in WeaponClass::ALL {
            let got = emitted.iter().filter(|c| **c == class).count();
            prop_assert!(got <= 1, "class {} emitted {} times", class, got);
            let has_run = expected_events(&frames, class) > 0;
            prop_assert_eq!(got == 1, has_run);
        }
    }

    // Malformed detections never change what is emitted.
    #[test]
    fn prop_malformed_never_changes_outcome(
        frames in prop::collection::vec(
            prop::collection::vec((0u8..2, 0.0f32..1.0), 0..3),
            0..40,
        ),
        garbage_conf in prop_oneof![Just(1.5f32), Just(-0.5f32), Just(f32::NAN)],
    ) {
        let clean = run_engine(&frames, Duration::ZERO);

        // Same stream with a malformed detection injected into every frame.
        let poisoned_frames: Vec<Vec<(u8, f32)>> = frames
            .iter()
            .map(|frame| {
                let mut frame = frame.clone();
                frame.push((0, garbage_conf));
                frame.push((1, garbage_conf));
                frame
            })
            .collect();
        let poisoned = run_engine(&poisoned_frames, Duration::ZERO);

        prop_assert_eq!(clean, poisoned);
    }
}
