//! # gesture_tree
//!
//! Interactive particle Christmas tree driven by hand gestures, with a
//! software-rendered window and a short MIDI chime on every mode change.
//!
//! ## Gesture → Mode mapping
//!
//! | Gesture | Mode | Scene |
//! |---|---|---|
//! | Fist | `TREE` | ornaments gather into a spiral cone |
//! | Open palm | `SCATTER` | ornaments burst into a shell; hand position steers rotation |
//! | Peace sign | `GALLERY` | photos line up on an arc facing the viewer |
//! | Pinch | `FOCUS` | one photo is pulled up close |
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: keyboard poses and the mouse pointer
//!   stand in for a camera-tracked hand.
//! * `leap`: **Hardware mode**: a LeapMotion controller via LeapC.
//!
//! An external landmark detector (any program printing `READY` then one JSON
//! detection per line) can be used instead with `--detector`.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `F` | Fist |
//! | `O` | Open palm |
//! | `P` | Peace sign |
//! | `C` | Pinch |
//! | `R` | Relaxed hand (no gesture) |
//! | `N` | Hand leaves the camera |
//! | mouse | Move the hand |
//! | `1`–`4` | Select TREE / SCATTER / FOCUS / GALLERY directly |
//! | `H` | Hide / show controls |
//! | `Q`, `Esc` | Quit |

pub mod chime;
pub mod gesture;
pub mod visualizer;
pub mod app;
