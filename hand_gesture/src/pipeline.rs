//! Frame-thread side of the gesture handoff.
//!
//! `GesturePipeline` owns the only [`HandState`] and the classifier. Once per
//! display frame the application calls [`GesturePipeline::pump`], which drains
//! every detection that arrived since the last frame, then lends the hand
//! record to the animation loop.
//!
//! A pipeline fed by an external detector also holds its [`DetectorHandle`]
//! and stops the child when dropped.

use std::sync::mpsc::{Receiver, TryRecvError};

use crate::classifier::{GestureClassifier, GestureThresholds, ModeChange};
use crate::hand_state::HandState;
use crate::landmark::DetectionFrame;
use crate::mode::AppMode;
use crate::source::DetectorHandle;

pub struct GesturePipeline {
    rx:         Option<Receiver<DetectionFrame>>,
    classifier: GestureClassifier,
    hand:       HandState,
    detector:   Option<DetectorHandle>,
}

impl GesturePipeline {
    pub fn new(rx: Receiver<DetectionFrame>, thresholds: GestureThresholds) -> Self {
        GesturePipeline {
            rx:         Some(rx),
            classifier: GestureClassifier::new(thresholds),
            hand:       HandState::default(),
            detector:   None,
        }
    }

    /// A pipeline fed only through [`GesturePipeline::feed`].
    pub fn detached(thresholds: GestureThresholds) -> Self {
        GesturePipeline {
            rx:         None,
            classifier: GestureClassifier::new(thresholds),
            hand:       HandState::default(),
            detector:   None,
        }
    }

    /// Tie the detector's lifetime to this pipeline.
    pub fn with_detector(mut self, handle: DetectorHandle) -> Self {
        self.detector = Some(handle);
        self
    }

    pub fn hand(&self) -> &HandState { &self.hand }

    /// False once the source thread has hung up.
    pub fn is_connected(&self) -> bool { self.rx.is_some() }

    /// Classify one frame synchronously.
    pub fn feed(&mut self, frame: &DetectionFrame, current: AppMode) -> Option<ModeChange> {
        self.classifier.process(frame, &mut self.hand, current)
    }

    /// Drain all pending frames in arrival order.
    ///
    /// Each frame is classified against the mode produced by the frames
    /// before it, so a burst yields the net transition for this display
    /// frame: at most one change, and none if the burst returns to `current`.
    pub fn pump(&mut self, current: AppMode) -> Option<ModeChange> {
        let mut mode = current;
        loop {
            let next = match &self.rx {
                Some(rx) => rx.try_recv(),
                None     => break,
            };
            match next {
                Ok(frame) => {
                    if let Some(change) = self.classifier.process(&frame, &mut self.hand, mode) {
                        mode = change.to;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("[gesture] landmark source disconnected");
                    self.rx = None;
                    self.hand.clear();
                    break;
                }
            }
        }
        (mode != current).then_some(ModeChange { from: current, to: mode })
    }
}

impl Drop for GesturePipeline {
    fn drop(&mut self) {
        if let Some(detector) = self.detector.take() {
            detector.kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::HandPose;
    use std::sync::mpsc;

    fn frame(ts: f64, pose: HandPose) -> DetectionFrame {
        DetectionFrame::with_hand(ts, pose.hand_at(0.5, 0.5))
    }

    #[test]
    fn pump_reports_single_transition() {
        let (tx, rx) = mpsc::channel();
        let mut p = GesturePipeline::new(rx, GestureThresholds::default());
        tx.send(frame(1.0, HandPose::OpenPalm)).unwrap();
        tx.send(frame(2.0, HandPose::OpenPalm)).unwrap();
        assert_eq!(p.pump(AppMode::Tree), Some(ModeChange { from: AppMode::Tree, to: AppMode::Scatter }));
        tx.send(frame(3.0, HandPose::OpenPalm)).unwrap();
        assert_eq!(p.pump(AppMode::Scatter), None);
    }

    #[test]
    fn burst_returning_to_current_is_silent() {
        let (tx, rx) = mpsc::channel();
        let mut p = GesturePipeline::new(rx, GestureThresholds::default());
        tx.send(frame(1.0, HandPose::Peace)).unwrap();
        tx.send(frame(2.0, HandPose::Fist)).unwrap();
        assert_eq!(p.pump(AppMode::Tree), None);
    }

    #[test]
    fn disconnect_clears_hand() {
        let (tx, rx) = mpsc::channel();
        let mut p = GesturePipeline::new(rx, GestureThresholds::default());
        tx.send(frame(1.0, HandPose::Fist)).unwrap();
        drop(tx);
        p.pump(AppMode::Tree);
        assert!(!p.is_connected());
        assert!(!p.hand().detected);
    }

    #[test]
    fn detached_pipeline_uses_feed() {
        let mut p = GesturePipeline::detached(GestureThresholds::default());
        assert_eq!(p.pump(AppMode::Tree), None);
        let c = p.feed(&frame(1.0, HandPose::Pinch), AppMode::Tree);
        assert_eq!(c.map(|c| c.to), Some(AppMode::Focus));
        assert!(p.hand().detected);
    }

    #[cfg(unix)]
    #[test]
    fn dropping_pipeline_stops_its_detector() {
        use crate::source::{spawn_landmark_source, DetectorProcess};

        let args = vec!["-c".to_string(), "echo READY; exec sleep 30".to_string()];
        let detector = DetectorProcess::spawn("sh", &args).unwrap();
        let handle = detector.handle();
        let p = GesturePipeline::new(spawn_landmark_source(detector), GestureThresholds::default())
            .with_detector(handle.clone());
        assert!(handle.is_running());

        drop(p);
        assert!(!handle.is_running());
    }
}
