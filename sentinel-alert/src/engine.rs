//! Alert decision engine: debounce and cooldown over per-frame detections
//!
//! One `AlertEngine` per video stream. The per-class state map is owned by
//! the engine value, so independent streams run isolated engines and tests
//! drive the clock explicitly through `process`.

use sentinel_core::{AlertEvent, Detection, WeaponClass};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tunable alerting rules, sourced from `DetectionConfig`.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    /// Minimum confidence for a detection to qualify.
    pub confidence_threshold: f32,
    /// Consecutive qualifying frames before a class goes active.
    pub min_consecutive_frames: u32,
    /// Quiet time after the last qualifying detection before an active
    /// class clears and re-arms.
    pub cooldown: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.90,
            min_consecutive_frames: 3,
            cooldown: Duration::from_secs(5),
        }
    }
}

/// Per-class alert lifecycle. At most one instance per class exists at any
/// time; it is discarded once the class clears.
#[derive(Debug, Clone)]
pub struct AlertState {
    pub active: bool,
    pub first_seen: Instant,
    pub last_seen: Instant,
    pub consecutive_hits: u32,
}

/// The Alert Decision Component. Never errors; malformed input degrades to
/// "no alert".
pub struct AlertEngine {
    policy: AlertPolicy,
    states: HashMap<WeaponClass, AlertState>,
    malformed_dropped: u64,
}

impl AlertEngine {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            policy,
            states: HashMap::new(),
            malformed_dropped: 0,
        }
    }

    /// Consume one frame's detections and return the alerts raised by it.
    ///
    /// An event is emitted exactly when a class transitions
    /// inactive-to-active: `min_consecutive_frames` qualifying frames in a
    /// row. While active, further qualifying frames only refresh
    /// `last_seen`; the class clears after `cooldown` elapses with no
    /// qualifying detection, which re-arms it.
    pub fn process(&mut self, detections: &[Detection], now: Instant) -> Vec<AlertEvent> {
        // Best qualifying confidence per class; multiple boxes of one class
        // in a single frame count once.
        let mut best: HashMap<WeaponClass, f32> = HashMap::new();
        for det in detections {
            if !det.is_well_formed() {
                self.malformed_dropped += 1;
                warn!(
                    class = %det.class,
                    confidence = det.confidence,
                    "dropping malformed detection"
                );
                continue;
            }
            let entry = best.entry(det.class).or_insert(det.confidence);
            if det.confidence > *entry {
                *entry = det.confidence;
            }
        }

        let mut events = Vec::new();
        for class in WeaponClass::ALL {
            let qualifying = best
                .get(&class)
                .copied()
                .filter(|c| *c >= self.policy.confidence_threshold);

            match qualifying {
                Some(confidence) => {
                    let state = self.states.entry(class).or_insert_with(|| AlertState {
                        active: false,
                        first_seen: now,
                        last_seen: now,
                        consecutive_hits: 0,
                    });
                    state.consecutive_hits = state.consecutive_hits.saturating_add(1);
                    state.last_seen = now;
                    if !state.active
                        && state.consecutive_hits >= self.policy.min_consecutive_frames
                    {
                        state.active = true;
                        events.push(AlertEvent::new(class, confidence));
                    }
                }
                None => {
                    let clear = match self.states.get_mut(&class) {
                        Some(state) => {
                            state.consecutive_hits = 0;
                            if state.active {
                                // Cooldown runs from the last qualifying
                                // detection.
                                now.duration_since(state.last_seen) > self.policy.cooldown
                            } else {
                                // A broken streak below the debounce
                                // threshold re-arms immediately.
                                true
                            }
                        }
                        None => false,
                    };
                    if clear {
                        if let Some(state) = self.states.remove(&class) {
                            if state.active {
                                debug!(%class, "alert cleared after cooldown");
                            }
                        }
                    }
                }
            }
        }

        events
    }

    /// Classes currently in the active (alerting) state.
    pub fn active_classes(&self) -> Vec<WeaponClass> {
        WeaponClass::ALL
            .into_iter()
            .filter(|c| self.states.get(c).map(|s| s.active).unwrap_or(false))
            .collect()
    }

    pub fn state(&self, class: WeaponClass) -> Option<&AlertState> {
        self.states.get(&class)
    }

    /// Detections dropped so far for data-quality reasons.
    pub fn malformed_dropped(&self) -> u64 {
        self.malformed_dropped
    }
}
