//! Synthetic hand skeletons.
//!
//! Used by the keyboard simulator and by tests: each pose places the
//! fingertips at known wrist distances, so the classifier sees exactly the
//! features the pose names.

use crate::landmark::{HandLandmarks, Landmark, LANDMARK_COUNT};

/// Wrist sits this far below the hand centre.
const PALM_LENGTH: f32 = 0.12;

/// Finger fan angles (radians from vertical), index → pinky.
const FINGER_ANGLES: [f32; 4] = [-0.22, 0.0, 0.2, 0.4];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    Fist,
    OpenPalm,
    Peace,
    Pinch,
    /// Half-open hand that matches none of the gesture tests.
    Relaxed,
}

impl HandPose {
    /// Wrist-to-tip distances for index, middle, ring, pinky.
    pub fn extensions(self) -> [f32; 4] {
        match self {
            HandPose::Fist     => [0.18, 0.18, 0.18, 0.18],
            HandPose::OpenPalm => [0.45, 0.45, 0.45, 0.45],
            HandPose::Peace    => [0.42, 0.42, 0.20, 0.20],
            HandPose::Pinch    => [0.26, 0.36, 0.36, 0.36],
            HandPose::Relaxed  => [0.29, 0.33, 0.36, 0.36],
        }
    }

    /// Thumb tip to index tip.
    pub fn pinch_distance(self) -> f32 {
        match self {
            HandPose::Pinch => 0.03,
            HandPose::Fist  => 0.12,
            _               => 0.20,
        }
    }

    /// Build the pose with its centre (landmark 9) at `(cx, cy)`.
    pub fn hand_at(self, cx: f32, cy: f32) -> HandLandmarks {
        synthetic_hand(cx, cy, self.extensions(), self.pinch_distance())
    }
}

/// Build a 21-point hand whose fingertips lie at the given wrist distances
/// and whose thumb tip is `pinch` away from the index tip.
pub fn synthetic_hand(cx: f32, cy: f32, extensions: [f32; 4], pinch: f32) -> HandLandmarks {
    let wrist = (cx, cy + PALM_LENGTH);
    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[0] = Landmark::new(wrist.0, wrist.1, 0.0);

    let at = |dir: (f32, f32), dist: f32| {
        Landmark::new(wrist.0 + dir.0 * dist, wrist.1 + dir.1 * dist, 0.0)
    };
    let lerp = |a: Landmark, b: Landmark, t: f32| {
        Landmark::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t, 0.0)
    };

    let mut index_tip = Landmark::default();
    for (f, (&angle, &ext)) in FINGER_ANGLES.iter().zip(extensions.iter()).enumerate() {
        let dir  = (angle.sin(), -angle.cos());
        let mcp  = at(dir, PALM_LENGTH);
        let tip  = at(dir, ext);
        let base = 5 + f * 4;
        pts[base]     = mcp;
        pts[base + 1] = lerp(mcp, tip, 0.4);
        pts[base + 2] = lerp(mcp, tip, 0.7);
        pts[base + 3] = tip;
        if f == 0 { index_tip = tip; }
    }

    // Thumb: from a base beside the wrist to a tip `pinch` left of the index tip.
    let cmc   = Landmark::new(wrist.0 - 0.04, wrist.1 - 0.02, 0.0);
    let thumb = Landmark::new(index_tip.x - pinch, index_tip.y, 0.0);
    pts[1] = cmc;
    pts[2] = lerp(cmc, thumb, 0.4);
    pts[3] = lerp(cmc, thumb, 0.7);
    pts[4] = thumb;

    HandLandmarks::new(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST};

    #[test]
    fn tips_land_at_requested_distances() {
        let hand = synthetic_hand(0.5, 0.5, [0.31, 0.32, 0.33, 0.34], 0.1);
        let w = hand[WRIST];
        for (tip, want) in [(INDEX_TIP, 0.31), (MIDDLE_TIP, 0.32), (RING_TIP, 0.33), (PINKY_TIP, 0.34)] {
            assert!((hand[tip].planar_distance(&w) - want).abs() < 1e-5, "tip {}", tip);
        }
        assert!((hand[THUMB_TIP].planar_distance(&hand[INDEX_TIP]) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn centre_is_middle_mcp() {
        let hand = HandPose::Peace.hand_at(0.3, 0.6);
        assert!((hand.center().x - 0.3).abs() < 1e-6);
        assert!((hand.center().y - 0.6).abs() < 1e-6);
    }
}
