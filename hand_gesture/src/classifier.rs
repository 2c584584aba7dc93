//! Gesture classification: landmark geometry → discrete mode.
//!
//! # Algorithm
//!
//! Once per new detector frame (repeated timestamps are skipped):
//!
//! * **No hand**: the hand record is cleared; no mode change.
//! * **Hand**: the hand centre and velocity are recorded, then the four
//!   fingertip-to-wrist distances and the thumb/index pinch distance are
//!   measured and tested in priority order: peace, pinch, fist, open palm.
//!   Peace and pinch go first because they are the deliberate gestures; a
//!   peace sign can also have a mean extension above the open-palm threshold.
//!
//! A [`ModeChange`] is reported only when the classified mode differs from the
//! mode currently active.

use crate::hand_state::HandState;
use crate::landmark::{
    DetectionFrame, HandLandmarks, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST,
};
use crate::mode::AppMode;

// ════════════════════════════════════════════════════════════════════════════
// GestureThresholds
// ════════════════════════════════════════════════════════════════════════════

/// Classification thresholds in normalized landmark units (empirically tuned).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureThresholds {
    /// Index and middle must exceed this for a peace sign.
    pub peace_extended: f32,
    /// Ring and pinky must stay below this for a peace sign.
    pub peace_folded:   f32,
    pub pinch:          f32,
    /// Mean extension below this is a fist.
    pub fist:           f32,
    /// Mean extension above this is an open palm.
    pub open_palm:      f32,
    /// Frame rate assumed by the velocity estimate. Not measured.
    pub velocity_fps:   f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds {
            peace_extended: 0.30,
            peace_folded:   0.35,
            pinch:          0.08,
            fist:           0.28,
            open_palm:      0.38,
            velocity_fps:   60.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFeatures
// ════════════════════════════════════════════════════════════════════════════

/// Geometric features of one hand, all measured in the image plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandFeatures {
    pub index:  f32,
    pub middle: f32,
    pub ring:   f32,
    pub pinky:  f32,
    /// Thumb tip to index tip.
    pub pinch:  f32,
}

impl HandFeatures {
    pub fn from_landmarks(hand: &HandLandmarks) -> Self {
        let wrist = &hand[WRIST];
        HandFeatures {
            index:  hand[INDEX_TIP].planar_distance(wrist),
            middle: hand[MIDDLE_TIP].planar_distance(wrist),
            ring:   hand[RING_TIP].planar_distance(wrist),
            pinky:  hand[PINKY_TIP].planar_distance(wrist),
            pinch:  hand[THUMB_TIP].planar_distance(&hand[INDEX_TIP]),
        }
    }

    pub fn average_extension(&self) -> f32 {
        (self.index + self.middle + self.ring + self.pinky) / 4.0
    }

    pub fn is_peace_sign(&self, t: &GestureThresholds) -> bool {
        self.index  > t.peace_extended
            && self.middle > t.peace_extended
            && self.ring   < t.peace_folded
            && self.pinky  < t.peace_folded
    }
}

/// Classify a hand; `None` means the shape is ambiguous and the mode holds.
pub fn classify(f: &HandFeatures, t: &GestureThresholds) -> Option<AppMode> {
    let avg = f.average_extension();
    if f.is_peace_sign(t) {
        Some(AppMode::Gallery)
    } else if f.pinch < t.pinch {
        Some(AppMode::Focus)
    } else if avg < t.fist {
        Some(AppMode::Tree)
    } else if avg > t.open_palm {
        Some(AppMode::Scatter)
    } else {
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// A transition reported by the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeChange {
    pub from: AppMode,
    pub to:   AppMode,
}

#[derive(Debug, Default)]
pub struct GestureClassifier {
    pub thresholds: GestureThresholds,
    last_timestamp: Option<f64>,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureThresholds) -> Self {
        GestureClassifier { thresholds, last_timestamp: None }
    }

    /// Process one detector frame against the currently active mode.
    ///
    /// Returns `None` for stale frames (same timestamp as the last one), for
    /// frames without a hand, for ambiguous shapes, and when the classified
    /// mode equals `current`.
    pub fn process(
        &mut self,
        frame:   &DetectionFrame,
        hand:    &mut HandState,
        current: AppMode,
    ) -> Option<ModeChange> {
        if self.last_timestamp == Some(frame.timestamp_ms) {
            return None;
        }
        self.last_timestamp = Some(frame.timestamp_ms);

        let Some(landmarks) = frame.first_hand() else {
            hand.clear();
            return None;
        };

        hand.observe(landmarks, self.thresholds.velocity_fps);

        let features = HandFeatures::from_landmarks(landmarks);
        match classify(&features, &self.thresholds) {
            Some(to) if to != current => {
                log::debug!(
                    "gesture {} → {} (avg={:.3} pinch={:.3})",
                    current, to, features.average_extension(), features.pinch
                );
                Some(ModeChange { from: current, to })
            }
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
