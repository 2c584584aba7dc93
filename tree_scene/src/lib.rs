//! # tree_scene
//!
//! The particle scene controller: several thousand ornaments, dust motes,
//! snowflakes and photos that glide between four formations.
//!
//! | Mode | Ornaments / dust | Photos |
//! |---|---|---|
//! | `Tree` | helical cone (dust hidden) | on the cone |
//! | `Scatter` | spherical shell, tumbling | on the shell, enlarged |
//! | `Gallery` | spherical shell | arc facing the camera |
//! | `Focus` | spherical shell, shrunk | one photo pulled up to the camera |
//!
//! Snowflakes ignore the mode and keep falling.
//!
//! The core has no timers or threads: the host calls
//! [`SceneController::tick`] once per displayed frame with the elapsed time and
//! the current hand record, and the controller drives a [`SceneHost`].

pub mod error;
pub mod config;
pub mod blend;
pub mod particle;
pub mod layout;
pub mod photo;
pub mod host;
pub mod registry;
pub mod formation;
pub mod rotation;
pub mod focus_blur;
pub mod scene;

pub use error::SceneError;
pub use config::SceneConfig;
pub use particle::{Archetype, Particle, ParticleId, PhotoKind, SnowflakeMotion, Transform, VisualHandle};
pub use photo::{photo_channel, ImageSource, PhotoInbox, PhotoLoader, PhotoTexture, UvWindow};
pub use host::{FrameView, HeadlessHost, Layer, RenderItem, SceneHost, VisualDesc, VisualKind};
pub use registry::ParticleRegistry;
pub use formation::{FormationContext, Target};
pub use rotation::RotationState;
pub use focus_blur::FocusBlur;
pub use scene::{SceneController, SceneState};

pub use hand_gesture::{AppMode, HandState};
