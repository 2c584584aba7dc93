//! Scene configuration.
//!
//! The layout constants are aesthetic choices, not derived values; they live
//! here so they can be tuned without touching the solver.

use glam::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub ornament_count:  usize,
    pub dust_count:      usize,
    pub snowflake_count: usize,

    pub tree_height:     f32,
    pub tree_radius:     f32,
    /// `t = U(0,1)^exponent` for the height sample.
    pub tree_exponent:   f32,
    /// Helix angle is `t * helix_turns * π`.
    pub helix_turns:     f32,

    pub camera_position: Vec3,
    /// World-space point the focused photo flies to.
    pub focus_point:     Vec3,
    pub gallery_radius:  f32,

    /// Start with a placeholder photo card until a real photo arrives.
    pub placeholder_photo: bool,
    /// Seconds of scene time before the "assets ready" signal fires.
    pub setup_latency:   f32,
    /// `None` seeds from OS entropy.
    pub seed:            Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            ornament_count:    1500,
            dust_count:        2500,
            snowflake_count:   200,
            tree_height:       24.0,
            tree_radius:       8.0,
            tree_exponent:     0.8,
            helix_turns:       50.0,
            camera_position:   Vec3::new(0.0, 2.0, 50.0),
            focus_point:       Vec3::new(0.0, 2.0, 35.0),
            gallery_radius:    15.0,
            placeholder_photo: true,
            setup_latency:     1.0,
            seed:              None,
        }
    }
}

impl SceneConfig {
    /// Override the particle population.
    pub fn with_counts(mut self, ornaments: usize, dust: usize, snowflakes: usize) -> Self {
        self.ornament_count  = ornaments;
        self.dust_count      = dust;
        self.snowflake_count = snowflakes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Top of the tree, where the star sits.
    pub fn star_position(&self) -> Vec3 {
        Vec3::new(0.0, self.tree_height / 2.0 + 1.2, 0.0)
    }
}
