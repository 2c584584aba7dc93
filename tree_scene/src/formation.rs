//! Formation Solver: per-frame target for each particle given the mode.
//!
//! | Mode | Non-photo | Photo |
//! |---|---|---|
//! | `Tree` | tree target | tree target |
//! | `Scatter` | scatter target | scatter target, ×2.5 |
//! | `Gallery` | scatter target | arc slot, ×3.0, faces camera |
//! | `Focus` | scatter target, ×0.8 | focus photo at the focus point (4.5); others scatter, ×0.8; all face camera |
//!
//! Dust ignores the scale column: it pulses in every mode and shrinks to
//! nothing in `Tree`. Snowflakes never reach the solver.

use std::f32::consts::PI;

use glam::{Mat3, Quat, Vec3};

use hand_gesture::AppMode;

use crate::particle::{Particle, ParticleId};

pub const DEFAULT_LERP_RATE: f32 = 2.0;
pub const FOCUS_LERP_RATE:   f32 = 5.0;
pub const SCALE_LERP_RATE:   f32 = 4.0;
pub const FOCUS_SCALE:       f32 = 4.5;

/// Frame-wide inputs shared by every particle's resolution.
#[derive(Clone, Copy, Debug)]
pub struct FormationContext<'a> {
    pub mode:           AppMode,
    pub focus:          Option<ParticleId>,
    /// The world focus point expressed in the rotating group's frame.
    pub focus_local:    Vec3,
    /// Live photo ids in registry order.
    pub photo_slots:    &'a [ParticleId],
    pub gallery_radius: f32,
    pub elapsed:        f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub position:    Vec3,
    pub scale:       f32,
    pub lerp_rate:   f32,
    pub face_camera: bool,
}

/// Arc position for the `index`th of `total` photos, in group space.
/// `None` when there is nothing to arrange.
pub fn gallery_slot(index: usize, total: usize, radius: f32) -> Option<Vec3> {
    if total == 0 || index >= total {
        return None;
    }
    let angle = (index as f32 / total as f32 - 0.5) * PI * 1.2;
    Some(Vec3::new(
        angle.sin() * radius,
        2.0 + (index as f32 * 0.5).sin() * 2.0,
        angle.cos() * radius - 10.0,
    ))
}

/// Scale the particle is steered towards this frame.
pub fn target_scale(p: &Particle, mode: AppMode, is_focus: bool, elapsed: f32) -> f32 {
    if p.is_dust {
        if mode == AppMode::Tree {
            return 0.0;
        }
        return p.base_scale * (0.8 + 0.4 * (elapsed * 4.0 + p.id.0 as f32).sin());
    }
    match mode {
        AppMode::Gallery if p.is_photo() => p.base_scale * 3.0,
        AppMode::Scatter if p.is_photo() => p.base_scale * 2.5,
        AppMode::Focus if is_focus       => FOCUS_SCALE,
        AppMode::Focus                   => p.base_scale * 0.8,
        _                                => p.base_scale,
    }
}

pub fn resolve(p: &Particle, ctx: &FormationContext<'_>) -> Target {
    let is_focus = ctx.mode == AppMode::Focus && ctx.focus == Some(p.id);

    let position = match ctx.mode {
        AppMode::Tree    => p.tree_target,
        AppMode::Scatter => p.scatter_target,
        AppMode::Gallery if p.is_photo() => {
            let index = ctx.photo_slots.iter().position(|id| *id == p.id);
            index
                .and_then(|i| gallery_slot(i, ctx.photo_slots.len(), ctx.gallery_radius))
                .unwrap_or(p.scatter_target)
        }
        AppMode::Gallery => p.scatter_target,
        AppMode::Focus if is_focus => ctx.focus_local,
        AppMode::Focus   => p.scatter_target,
    };

    Target {
        position,
        scale:       target_scale(p, ctx.mode, is_focus, ctx.elapsed),
        lerp_rate:   if is_focus { FOCUS_LERP_RATE } else { DEFAULT_LERP_RATE },
        face_camera: p.is_photo() && matches!(ctx.mode, AppMode::Gallery | AppMode::Focus),
    }
}

/// Rotation whose +Z axis points from `from` towards `to`, keeping +Y up.
/// `None` when the direction is degenerate (coincident points or straight
/// up/down).
pub fn facing(from: Vec3, to: Vec3) -> Option<Quat> {
    let z = (to - from).try_normalize()?;
    let x = Vec3::Y.cross(z).try_normalize()?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{Archetype, PhotoKind, Transform, VisualHandle};

    fn particle(id: u32, archetype: Archetype, is_dust: bool) -> Particle {
        Particle {
            id: ParticleId(id),
            archetype,
            is_dust,
            tree_target:    Vec3::new(1.0, 2.0, 3.0),
            scatter_target: Vec3::new(-10.0, 0.0, 5.0),
            base_scale:     1.0,
            spin_rate:      Vec3::ZERO,
            transform:      Transform::at(Vec3::ZERO, 1.0),
            visual:         VisualHandle(0),
        }
    }

    fn ctx(mode: AppMode, focus: Option<ParticleId>, slots: &[ParticleId]) -> FormationContext<'_> {
        FormationContext {
            mode,
            focus,
            focus_local:    Vec3::new(0.0, 2.0, 35.0),
            photo_slots:    slots,
            gallery_radius: 15.0,
            elapsed:        0.0,
        }
    }

    #[test]
    fn ornaments_follow_mode_targets() {
        let p = particle(0, Archetype::OrnamentBox, false);
        assert_eq!(resolve(&p, &ctx(AppMode::Tree, None, &[])).position, p.tree_target);
        for mode in [AppMode::Scatter, AppMode::Gallery, AppMode::Focus] {
            assert_eq!(resolve(&p, &ctx(mode, None, &[])).position, p.scatter_target);
        }
        assert_eq!(resolve(&p, &ctx(AppMode::Focus, None, &[])).scale, 0.8);
    }

    #[test]
    fn focus_photo_goes_to_focus_point_fast() {
        let p = particle(7, Archetype::Photo(PhotoKind::Supplied), false);
        let t = resolve(&p, &ctx(AppMode::Focus, Some(ParticleId(7)), &[ParticleId(7)]));
        assert_eq!(t.position, Vec3::new(0.0, 2.0, 35.0));
        assert_eq!(t.lerp_rate, FOCUS_LERP_RATE);
        assert_eq!(t.scale, FOCUS_SCALE);
        assert!(t.face_camera);

        let other = particle(8, Archetype::Photo(PhotoKind::Supplied), false);
        let t = resolve(&other, &ctx(AppMode::Focus, Some(ParticleId(7)), &[ParticleId(7), ParticleId(8)]));
        assert_eq!(t.position, other.scatter_target);
        assert_eq!(t.lerp_rate, DEFAULT_LERP_RATE);
        assert!(t.face_camera);
    }

    #[test]
    fn focus_without_target_falls_back_to_scatter() {
        let p = particle(3, Archetype::Photo(PhotoKind::Supplied), false);
        let t = resolve(&p, &ctx(AppMode::Focus, None, &[ParticleId(3)]));
        assert_eq!(t.position, p.scatter_target);
        assert_eq!(t.lerp_rate, DEFAULT_LERP_RATE);
    }

    #[test]
    fn gallery_arranges_photos_on_arc() {
        let ids = [ParticleId(1), ParticleId(2), ParticleId(3)];
        let p = particle(2, Archetype::Photo(PhotoKind::Supplied), false);
        let t = resolve(&p, &ctx(AppMode::Gallery, None, &ids));
        assert_eq!(Some(t.position), gallery_slot(1, 3, 15.0));
        assert_eq!(t.scale, 3.0);
        assert!(t.face_camera);
    }

    #[test]
    fn gallery_slot_geometry() {
        // First slot sits at angle -0.6π.
        let s = gallery_slot(0, 4, 15.0).unwrap();
        let a = -0.6 * PI;
        assert!((s.x - a.sin() * 15.0).abs() < 1e-4);
        assert!((s.y - 2.0).abs() < 1e-6);
        assert!((s.z - (a.cos() * 15.0 - 10.0)).abs() < 1e-4);
        assert_eq!(gallery_slot(0, 0, 15.0), None);
        assert_eq!(gallery_slot(4, 4, 15.0), None);
    }

    #[test]
    fn dust_hides_in_tree_and_pulses_elsewhere() {
        let d = particle(5, Archetype::Dust, true);
        assert_eq!(target_scale(&d, AppMode::Tree, false, 1.0), 0.0);
        for mode in [AppMode::Scatter, AppMode::Gallery, AppMode::Focus] {
            let s = target_scale(&d, mode, false, 1.3);
            assert!((0.4..=1.2).contains(&s), "{} -> {}", mode, s);
        }
    }

    #[test]
    fn scatter_enlarges_photos_only() {
        let photo = particle(1, Archetype::Photo(PhotoKind::Supplied), false);
        let box_  = particle(2, Archetype::OrnamentGoldBox, false);
        assert_eq!(target_scale(&photo, AppMode::Scatter, false, 0.0), 2.5);
        assert_eq!(target_scale(&box_,  AppMode::Scatter, false, 0.0), 1.0);
        assert_eq!(target_scale(&photo, AppMode::Tree,    false, 0.0), 1.0);
    }

    #[test]
    fn facing_points_plus_z_at_target() {
        let from = Vec3::new(3.0, 1.0, 0.0);
        let to   = Vec3::new(0.0, 2.0, 50.0);
        let q = facing(from, to).unwrap();
        let forward = q * Vec3::Z;
        assert!(forward.abs_diff_eq((to - from).normalize(), 1e-5));
        assert!((q * Vec3::Y).y > 0.0);
        assert!(facing(from, from).is_none());
    }
}
