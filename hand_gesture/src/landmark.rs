//! Hand landmarks as delivered by an external detector.
//!
//! Coordinates follow the usual hand-landmarker convention: `x` and `y` are
//! normalized to the image (0.0–1.0, origin top-left), `z` is relative depth.

use serde::Deserialize;

use crate::error::GestureError;

pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (only the ones the classifier reads are named)
// ════════════════════════════════════════════════════════════════════════════

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP:   usize = 16;
pub const PINKY_TIP:  usize = 20;

/// Bone pairs for drawing the hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 23] = [
    (0, 1),  (1, 2),   (2, 3),   (3, 4),
    (0, 5),  (5, 6),   (6, 7),   (7, 8),
    (0, 9),  (9, 10),  (10, 11), (11, 12),
    (0, 13), (13, 14), (14, 15), (15, 16),
    (0, 17), (17, 18), (18, 19), (19, 20),
    (5, 9),  (9, 13),  (13, 17),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Distance in the image plane; depth is ignored.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand: the full 21-point skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    pub points:     [Landmark; LANDMARK_COUNT],
    pub handedness: Option<String>,
    pub score:      Option<f32>,
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandLandmarks { points, handedness: None, score: None }
    }

    pub fn from_slice(points: &[Landmark]) -> Result<Self, GestureError> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| GestureError::LandmarkCount(points.len()))?;
        Ok(HandLandmarks::new(points))
    }

    /// Middle-finger MCP joint, used as the hand centre.
    pub fn center(&self) -> &Landmark {
        &self.points[MIDDLE_MCP]
    }
}

impl std::ops::Index<usize> for HandLandmarks {
    type Output = Landmark;
    fn index(&self, i: usize) -> &Landmark { &self.points[i] }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectionFrame
// ════════════════════════════════════════════════════════════════════════════

/// One detector result for one video frame.
///
/// `timestamp_ms` is the source frame time; frames repeating the previous
/// timestamp are skipped by the classifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionFrame {
    pub timestamp_ms: f64,
    pub hands:        Vec<HandLandmarks>,
}

impl DetectionFrame {
    pub fn empty(timestamp_ms: f64) -> Self {
        DetectionFrame { timestamp_ms, hands: Vec::new() }
    }

    pub fn with_hand(timestamp_ms: f64, hand: HandLandmarks) -> Self {
        DetectionFrame { timestamp_ms, hands: vec![hand] }
    }

    /// Only the first detected hand is ever tracked.
    pub fn first_hand(&self) -> Option<&HandLandmarks> {
        self.hands.first()
    }

    /// Parse one detector output line.
    ///
    /// ```json
    /// {"timestamp_ms": 1234.5,
    ///  "hands": [{"handedness": "Right", "score": 0.97,
    ///             "landmarks": [[0.51, 0.83, 0.0], {"x": 0.5, "y": 0.7, "z": -0.02}, ...]}]}
    /// ```
    pub fn from_json_line(line: &str) -> Result<Self, GestureError> {
        let raw: FrameJson = serde_json::from_str(line)?;
        let mut hands = Vec::with_capacity(raw.hands.len());
        for h in raw.hands {
            let points: Vec<Landmark> = h.landmarks.into_iter().map(PointJson::into_landmark).collect();
            let mut hand = HandLandmarks::from_slice(&points)?;
            hand.handedness = h.handedness;
            hand.score      = h.score;
            hands.push(hand);
        }
        Ok(DetectionFrame { timestamp_ms: raw.timestamp_ms, hands })
    }
}

// ── wire form ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum PointJson {
    Array([f32; 3]),
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
}

impl PointJson {
    fn into_landmark(self) -> Landmark {
        match self {
            PointJson::Array([x, y, z])    => Landmark::new(x, y, z),
            PointJson::Object { x, y, z } => Landmark::new(x, y, z),
        }
    }
}

#[derive(Deserialize)]
struct HandJson {
    landmarks: Vec<PointJson>,
    #[serde(default)]
    handedness: Option<String>,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Deserialize)]
struct FrameJson {
    timestamp_ms: f64,
    #[serde(default)]
    hands: Vec<HandJson>,
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
