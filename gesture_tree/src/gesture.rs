//! Hand sources for the interactive app: keyboard/mouse simulation and,
//! with the `leap` feature, a LeapMotion controller.
//!
//! Both produce the same 21-point [`DetectionFrame`]s a camera detector
//! would, so everything downstream of the channel is source-agnostic.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use hand_gesture::{DetectionFrame, HandPose, LandmarkSource};

/// Detection cadence of the simulated camera.
const SIM_FRAME_INTERVAL: Duration = Duration::from_millis(33);

// ════════════════════════════════════════════════════════════════════════════
// SimInput: raw events from the window
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Show this hand shape; `None` takes the hand out of view.
    Pose(Option<HandPose>),
    /// Pointer position over the window, normalized 0.0–1.0 as the user
    /// sees it (mirrored).
    Pointer { x: f32, y: f32 },
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// SimHand: the simulated hand between frames
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHand {
    pub pose:   Option<HandPose>,
    /// Hand centre in camera coordinates (not mirrored).
    pub center: (f32, f32),
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand { pose: None, center: (0.5, 0.5) }
    }
}

impl SimHand {
    /// Apply one input. Returns false on quit.
    pub fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Pose(p) => self.pose = p,
            SimInput::Pointer { x, y } => {
                // The view is mirrored, so the camera sees the pointer flipped.
                self.center = (1.0 - x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
            }
            SimInput::Quit => return false,
        }
        true
    }

    pub fn frame(&self, timestamp_ms: f64) -> DetectionFrame {
        match self.pose {
            Some(pose) => DetectionFrame::with_hand(timestamp_ms, pose.hand_at(self.center.0, self.center.1)),
            None       => DetectionFrame::empty(timestamp_ms),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source driven by [`SimInput`] events from the visualizer window.
///
/// Emits one frame per [`SIM_FRAME_INTERVAL`] like a webcam would, whether or
/// not anything changed, with strictly increasing timestamps.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
}

impl LandmarkSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<DetectionFrame>) {
        let start = Instant::now();
        let mut hand = SimHand::default();
        let mut last_ts = -1.0_f64;

        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(input) => {
                        if !hand.apply(input) { return; }
                    }
                    Err(TryRecvError::Empty)        => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            let ts = (start.elapsed().as_secs_f64() * 1000.0).max(last_ts + 1.0);
            last_ts = ts;
            if tx.send(hand.frame(ts)).is_err() { return; }

            thread::sleep(SIM_FRAME_INTERVAL);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Each tracked hand is converted to the 21-point layout: the wrist, then
/// four joints per digit (thumb first), each the far end of one bone.
/// Millimetre coordinates are normalized to the image convention with
/// x = (x + 200) / 400 and y = 1 − (y − 50) / 400.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<DetectionFrame>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                log::error!("[leap] failed to create LeapC connection: {:?}", e);
                return;
            }
        };
        if let Err(e) = connection.open() {
            log::error!("[leap] failed to open LeapMotion device: {:?}", e);
            return;
        }
        log::info!("[leap] connected");

        let start = Instant::now();
        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let ts = start.elapsed().as_secs_f64() * 1000.0;
                let hands: Vec<_> = frame.hands().collect();
                let detection = match hands.first().and_then(|h| leap_hand_landmarks(h)) {
                    Some(hand) => DetectionFrame::with_hand(ts, hand),
                    None       => DetectionFrame::empty(ts),
                };
                if tx.send(detection).is_err() { return; }
            }
        }
    }
}

#[cfg(feature = "leap")]
fn leap_hand_landmarks(hand: &leaprs::Hand) -> Option<hand_gesture::HandLandmarks> {
    use hand_gesture::{HandLandmarks, Landmark};

    let norm = |x: f32, y: f32, z: f32| {
        Landmark::new((x + 200.0) / 400.0, 1.0 - (y - 50.0) / 400.0, z / 400.0)
    };

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let mut points = Vec::with_capacity(hand_gesture::LANDMARK_COUNT);
    let w = digits[2].metacarpal().prev_joint();
    points.push(norm(w.x, w.y, w.z));
    for d in &digits[..5] {
        for j in [
            d.metacarpal().next_joint(),
            d.proximal().next_joint(),
            d.intermediate().next_joint(),
            d.distal().next_joint(),
        ] {
            points.push(norm(j.x, j.y, j.z));
        }
    }

    let mut lm = HandLandmarks::from_slice(&points).ok()?;
    let side = if hand.hand_type() == leaprs::HandType::Left { "Left" } else { "Right" };
    lm.handedness = Some(side.to_string());
    Some(lm)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::{spawn_landmark_source, AppMode, GestureClassifier, GestureThresholds, HandState};
    use std::sync::mpsc;

    #[test]
    fn no_pose_means_no_hand() {
        let hand = SimHand::default();
        assert!(hand.frame(1.0).first_hand().is_none());
    }

    #[test]
    fn pointer_is_mirrored_into_camera_space() {
        let mut hand = SimHand::default();
        assert!(hand.apply(SimInput::Pointer { x: 0.8, y: 0.3 }));
        assert!((hand.center.0 - 0.2).abs() < 1e-6);
        assert!((hand.center.1 - 0.3).abs() < 1e-6);
        assert!(hand.apply(SimInput::Pose(Some(HandPose::OpenPalm))));
        let f = hand.frame(5.0);
        let c = f.first_hand().unwrap().center();
        assert!((c.x - 0.2).abs() < 1e-5 && (c.y - 0.3).abs() < 1e-5);
        assert!(!hand.apply(SimInput::Quit));
    }

    #[test]
    fn key_poses_classify_as_their_modes() {
        let mut classifier = GestureClassifier::new(GestureThresholds::default());
        let mut state = HandState::default();
        let mut hand = SimHand::default();
        let cases = [
            (HandPose::OpenPalm, AppMode::Scatter),
            (HandPose::Peace,    AppMode::Gallery),
            (HandPose::Pinch,    AppMode::Focus),
            (HandPose::Fist,     AppMode::Tree),
        ];
        let mut mode = AppMode::Tree;
        for (i, (pose, expected)) in cases.iter().enumerate() {
            hand.apply(SimInput::Pose(Some(*pose)));
            let change = classifier.process(&hand.frame(i as f64), &mut state, mode).unwrap();
            assert_eq!(change.to, *expected);
            mode = change.to;
        }
    }

    #[test]
    fn source_thread_streams_frames_until_quit() {
        let (tx, rx) = mpsc::channel();
        let frames = spawn_landmark_source(SimHandSource { rx });
        tx.send(SimInput::Pose(Some(HandPose::Fist))).unwrap();

        let mut last = f64::NEG_INFINITY;
        let mut saw_hand = false;
        for _ in 0..5 {
            let f = frames.recv().unwrap();
            assert!(f.timestamp_ms > last);
            last = f.timestamp_ms;
            saw_hand |= f.first_hand().is_some();
        }
        assert!(saw_hand);

        tx.send(SimInput::Quit).unwrap();
        // The source hangs up after quitting.
        while frames.recv().is_ok() {}
    }
}
