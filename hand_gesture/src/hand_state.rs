//! The continuously-updated hand record read by the scene every frame.
//!
//! Single writer (the classifier, inside [`GesturePipeline`]) and single
//! reader (the animation loop, which borrows it immutably once per tick).
//! Both run on the frame thread; detector threads hand over immutable
//! [`DetectionFrame`] snapshots through a channel and never touch this record.
//!
//! [`GesturePipeline`]: crate::pipeline::GesturePipeline
//! [`DetectionFrame`]: crate::landmark::DetectionFrame

use crate::landmark::HandLandmarks;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandState {
    pub detected:   bool,
    /// Hand centre in [-1, 1], recentred from detector [0, 1] space.
    pub x:          f32,
    pub y:          f32,
    /// `(new_x - old_x) * fps`, with a fixed fps assumption.
    pub velocity_x: f32,
    pub landmarks:  Option<HandLandmarks>,
}

impl HandState {
    /// No hand this frame. `x` / `y` keep their last value.
    pub fn clear(&mut self) {
        self.detected   = false;
        self.landmarks  = None;
        self.velocity_x = 0.0;
    }

    /// Record a detected hand and update position and velocity.
    pub fn observe(&mut self, hand: &HandLandmarks, fps: f32) {
        let c = hand.center();
        let new_x = (c.x - 0.5) * 2.0;
        self.velocity_x = (new_x - self.x) * fps;
        self.x          = new_x;
        self.y          = (c.y - 0.5) * 2.0;
        self.detected   = true;
        self.landmarks  = Some(hand.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::HandPose;

    #[test]
    fn observe_recentres_and_differentiates() {
        let mut hs = HandState::default();
        hs.observe(&HandPose::OpenPalm.hand_at(0.75, 0.25), 60.0);
        assert!(hs.detected);
        assert!((hs.x - 0.5).abs() < 1e-6);
        assert!((hs.y + 0.5).abs() < 1e-6);
        assert!((hs.velocity_x - 30.0).abs() < 1e-4);

        hs.observe(&HandPose::OpenPalm.hand_at(0.75, 0.25), 60.0);
        assert_eq!(hs.velocity_x, 0.0);
    }

    #[test]
    fn clear_keeps_position() {
        let mut hs = HandState::default();
        hs.observe(&HandPose::Fist.hand_at(1.0, 0.5), 60.0);
        hs.clear();
        assert!(!hs.detected);
        assert!(hs.landmarks.is_none());
        assert_eq!(hs.velocity_x, 0.0);
        assert!((hs.x - 1.0).abs() < 1e-6);
    }
}
