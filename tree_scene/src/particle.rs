//! Particle records.

use glam::Vec3;

use crate::host::Layer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u32);

/// Ownership token for one renderable object in the [`SceneHost`].
///
/// [`SceneHost`]: crate::host::SceneHost
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// Fall / sway parameters carried only by snowflakes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowflakeMotion {
    pub fall_speed:  f32,
    pub sway_speed:  f32,
    pub sway_amount: f32,
    pub initial_x:   f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoKind {
    /// The greeting card shown until the first real photo arrives.
    Placeholder,
    Supplied,
}

/// Visual / behavioural category of a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Archetype {
    OrnamentBox,
    OrnamentGoldBox,
    OrnamentGoldSphere,
    OrnamentRed,
    CandyCane,
    Dust,
    Snowflake(SnowflakeMotion),
    Photo(PhotoKind),
}

impl Archetype {
    pub fn is_photo(&self) -> bool { matches!(self, Archetype::Photo(_)) }

    /// Snowflakes live in world space; everything else rides the rotating group.
    pub fn layer(&self) -> Layer {
        match self {
            Archetype::Snowflake(_) => Layer::World,
            _                       => Layer::Group,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::OrnamentBox        => "box",
            Archetype::OrnamentGoldBox    => "gold box",
            Archetype::OrnamentGoldSphere => "gold sphere",
            Archetype::OrnamentRed        => "red sphere",
            Archetype::CandyCane          => "candy cane",
            Archetype::Dust               => "dust",
            Archetype::Snowflake(_)       => "snowflake",
            Archetype::Photo(_)           => "photo",
        }
    }
}

/// Position, Euler XYZ rotation (radians) and uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale:    f32,
}

impl Transform {
    pub fn at(position: Vec3, scale: f32) -> Self {
        Transform { position, rotation: Vec3::ZERO, scale }
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub id:             ParticleId,
    pub archetype:      Archetype,
    /// Pulses in size and vanishes in the tree formation.
    pub is_dust:        bool,
    pub tree_target:    Vec3,
    pub scatter_target: Vec3,
    pub base_scale:     f32,
    /// Per-axis spin (rad/s) used while scattered.
    pub spin_rate:      Vec3,
    pub transform:      Transform,
    pub(crate) visual:  VisualHandle,
}

impl Particle {
    pub fn visual(&self) -> VisualHandle { self.visual }
    pub fn is_photo(&self) -> bool { self.archetype.is_photo() }
}
