//! # hand_gesture
//!
//! Turns a stream of hand-landmark detections into a debounced application
//! mode plus continuous control signals (hand centre, horizontal velocity).
//!
//! ## Gesture → Mode mapping
//!
//! Checked in priority order, first match wins:
//!
//! | Gesture | Feature test | Mode |
//! |---|---|---|
//! | Peace sign | index, middle > 0.30 and ring, pinky < 0.35 | `Gallery` |
//! | Pinch | thumb tip ↔ index tip < 0.08 | `Focus` |
//! | Fist | mean fingertip extension < 0.28 | `Tree` |
//! | Open palm | mean fingertip extension > 0.38 | `Scatter` |
//! | anything else | none | mode held |
//!
//! Distances are measured in normalized image units from the wrist
//! (landmark 0) to each fingertip.
//!
//! ## Data flow
//!
//! ```text
//! detector thread ──DetectionFrame──▶ GesturePipeline ──▶ HandState (read by the scene)
//!                                          │
//!                                          └──▶ ModeChange (at most one per transition)
//! ```

pub mod error;
pub mod landmark;
pub mod mode;
pub mod hand_state;
pub mod classifier;
pub mod pose;
pub mod source;
pub mod pipeline;

pub use error::GestureError;
pub use landmark::{DetectionFrame, HandLandmarks, Landmark, HAND_CONNECTIONS, LANDMARK_COUNT};
pub use mode::AppMode;
pub use hand_state::HandState;
pub use classifier::{classify, GestureClassifier, GestureThresholds, HandFeatures, ModeChange};
pub use pose::HandPose;
pub use source::{spawn_landmark_source, DetectorHandle, DetectorProcess, JsonLinesSource, LandmarkSource};
pub use pipeline::GesturePipeline;
