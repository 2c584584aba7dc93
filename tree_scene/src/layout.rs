//! Creation-time geometry: where each particle lives in every formation.
//!
//! All functions draw from a caller-supplied RNG so layouts are reproducible
//! under a fixed seed.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::config::SceneConfig;
use crate::particle::{Archetype, SnowflakeMotion};

/// Scatter shell radii.
pub const ORNAMENT_SHELL: (f32, f32) = (8.0, 20.0);
pub const DUST_SHELL:     (f32, f32) = (12.0, 32.0);

/// Snowflakes below this height respawn above the scene.
pub const SNOW_FLOOR: f32 = -20.0;

/// Point on the helical cone.
///
/// `t = U^exponent` picks the height; the radius tapers from `tree_radius` at
/// the base to a 0.5 floor at the tip, jittered ×0.8–1.2 and clamped to the
/// tree radius; the angle `t·turns·π + U(0,π)` winds a tight spiral.
pub fn tree_target<R: Rng + ?Sized>(rng: &mut R, cfg: &SceneConfig) -> Vec3 {
    let h = cfg.tree_height;
    let t = rng.gen::<f32>().powf(cfg.tree_exponent);
    let y = t * h - h / 2.0;

    let r_max = (cfg.tree_radius * (1.0 - t)).max(0.5);
    let r     = (r_max * rng.gen_range(0.8..1.2)).min(cfg.tree_radius);
    let angle = t * cfg.helix_turns * PI + rng.gen::<f32>() * PI;

    Vec3::new(angle.cos() * r, y, angle.sin() * r)
}

/// Uniform point on a spherical shell with radius in `[min, max)`.
pub fn scatter_target<R: Rng + ?Sized>(rng: &mut R, shell: (f32, f32)) -> Vec3 {
    let r     = rng.gen_range(shell.0..shell.1);
    let theta = rng.gen::<f32>() * TAU;
    let phi   = (2.0 * rng.gen::<f32>() - 1.0).acos();
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// Photos tumble slowly so they stay readable.
pub fn spin_rate<R: Rng + ?Sized>(rng: &mut R, archetype: &Archetype) -> Vec3 {
    let mult = if archetype.is_photo() { 0.3 } else { 2.0 };
    Vec3::new(
        (rng.gen::<f32>() - 0.5) * mult,
        (rng.gen::<f32>() - 0.5) * mult,
        (rng.gen::<f32>() - 0.5) * mult,
    )
}

/// Map a uniform roll to an ornament kind:
/// 40 % box, 30 % gold box, 22 % gold sphere, 5 % red, 3 % candy cane.
pub fn ornament_archetype(roll: f32) -> Archetype {
    if roll < 0.40 {
        Archetype::OrnamentBox
    } else if roll < 0.70 {
        Archetype::OrnamentGoldBox
    } else if roll < 0.92 {
        Archetype::OrnamentGoldSphere
    } else if roll < 0.97 {
        Archetype::OrnamentRed
    } else {
        Archetype::CandyCane
    }
}

pub fn ornament_scale<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    0.4 + rng.gen::<f32>() * 0.5
}

pub fn dust_scale<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    0.5 + rng.gen::<f32>()
}

/// Random initial tumble for ornaments.
pub fn initial_rotation<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(rng.gen::<f32>() * 6.0, rng.gen::<f32>() * 6.0, rng.gen::<f32>() * 6.0)
}

/// Spawn position, motion and scale for one snowflake: a shell of radius
/// 30–50 lifted 20 units above the tree.
pub fn snowflake_spawn<R: Rng + ?Sized>(rng: &mut R) -> (Vec3, SnowflakeMotion, f32) {
    let scale = 0.3 + rng.gen::<f32>() * 0.5;
    let mut pos = scatter_target(rng, (30.0, 50.0));
    pos.y += 20.0;
    let motion = SnowflakeMotion {
        fall_speed:  0.5 + rng.gen::<f32>(),
        sway_speed:  0.2 + rng.gen::<f32>() * 0.3,
        sway_amount: 1.0 + rng.gen::<f32>() * 2.0,
        initial_x:   pos.x,
    };
    (pos, motion, scale)
}

pub fn snowflake_respawn_height<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    40.0 + rng.gen::<f32>() * 10.0
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tree_samples_stay_inside_cone_bounds() {
        let cfg = SceneConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let half = cfg.tree_height / 2.0;
        for _ in 0..10_000 {
            let p = tree_target(&mut rng, &cfg);
            assert!(p.y >= -half && p.y <= half, "y = {}", p.y);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r >= 0.0 && r <= cfg.tree_radius + 1e-4, "r = {}", r);
        }
    }

    #[test]
    fn tree_narrows_towards_the_top() {
        let cfg = SceneConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let (mut low, mut high) = (Vec::new(), Vec::new());
        for _ in 0..5_000 {
            let p = tree_target(&mut rng, &cfg);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            if p.y < -6.0 { low.push(r) } else if p.y > 6.0 { high.push(r) }
        }
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        assert!(mean(&low) > mean(&high));
    }

    #[test]
    fn scatter_radius_within_shell() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..2_000 {
            let o = scatter_target(&mut rng, ORNAMENT_SHELL).length();
            assert!(o >= 8.0 - 1e-3 && o < 20.0 + 1e-3);
            let d = scatter_target(&mut rng, DUST_SHELL).length();
            assert!(d >= 12.0 - 1e-3 && d < 32.0 + 1e-3);
        }
    }

    #[test]
    fn photos_spin_slower() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let s = spin_rate(&mut rng, &Archetype::Photo(crate::particle::PhotoKind::Supplied));
            assert!(s.abs().max_element() <= 0.15);
            let o = spin_rate(&mut rng, &Archetype::OrnamentBox);
            assert!(o.abs().max_element() <= 1.0);
        }
    }

    #[test]
    fn ornament_distribution_boundaries() {
        assert_eq!(ornament_archetype(0.0),   Archetype::OrnamentBox);
        assert_eq!(ornament_archetype(0.40),  Archetype::OrnamentGoldBox);
        assert_eq!(ornament_archetype(0.70),  Archetype::OrnamentGoldSphere);
        assert_eq!(ornament_archetype(0.92),  Archetype::OrnamentRed);
        assert_eq!(ornament_archetype(0.97),  Archetype::CandyCane);
        assert_eq!(ornament_archetype(0.999), Archetype::CandyCane);
    }

    #[test]
    fn snowflakes_spawn_on_lifted_shell() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let (pos, motion, scale) = snowflake_spawn(&mut rng);
            let r = (pos - Vec3::new(0.0, 20.0, 0.0)).length();
            assert!(r >= 30.0 - 1e-3 && r < 50.0 + 1e-3);
            assert_eq!(motion.initial_x, pos.x);
            assert!((0.5..1.5).contains(&motion.fall_speed));
            assert!((0.3..0.8).contains(&scale));
            assert!((40.0..50.0).contains(&snowflake_respawn_height(&mut rng)));
        }
    }
}
