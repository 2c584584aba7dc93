//! Particle Registry: the flat list of every particle in the scene.
//!
//! Ids are allocated monotonically and the list is only appended to or
//! filtered, so it stays sorted by id and lookups can binary-search.

use std::sync::Arc;

use rand::Rng;

use crate::config::SceneConfig;
use crate::host::{SceneHost, VisualDesc, VisualKind};
use crate::layout;
use crate::particle::{Archetype, Particle, ParticleId, PhotoKind, Transform};
use crate::photo::PhotoTexture;

/// Resting scale of every photo card.
pub const PHOTO_BASE_SCALE: f32 = 0.8;

#[derive(Debug, Default)]
pub struct ParticleRegistry {
    particles: Vec<Particle>,
    next_id:   u32,
}

/// Visual for a non-photo archetype. Photos carry their own texture.
fn visual_kind(archetype: &Archetype) -> Option<VisualKind> {
    Some(match archetype {
        Archetype::OrnamentBox        => VisualKind::GreenBox,
        Archetype::OrnamentGoldBox    => VisualKind::GoldBox,
        Archetype::OrnamentGoldSphere => VisualKind::GoldSphere,
        Archetype::OrnamentRed        => VisualKind::RedSphere,
        Archetype::CandyCane          => VisualKind::CandyCane,
        Archetype::Dust               => VisualKind::Dust,
        Archetype::Snowflake(_)       => VisualKind::Snowflake,
        Archetype::Photo(_)           => return None,
    })
}

impl ParticleRegistry {
    pub fn new() -> Self { Self::default() }

    fn alloc_id(&mut self) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push<H: SceneHost + ?Sized>(&mut self, host: &mut H, mut particle: Particle, kind: VisualKind) -> ParticleId {
        particle.visual = host.add_object(&VisualDesc { kind, layer: particle.archetype.layer() });
        let id = particle.id;
        self.particles.push(particle);
        id
    }

    /// Create the ornaments, dust and snowflakes described by `cfg`.
    pub fn populate<R, H>(&mut self, cfg: &SceneConfig, rng: &mut R, host: &mut H)
    where
        R: Rng + ?Sized,
        H: SceneHost + ?Sized,
    {
        for _ in 0..cfg.ornament_count {
            let archetype = layout::ornament_archetype(rng.gen());
            let tree      = layout::tree_target(rng, cfg);
            let scatter   = layout::scatter_target(rng, layout::ORNAMENT_SHELL);
            let scale     = layout::ornament_scale(rng);
            let spin      = layout::spin_rate(rng, &archetype);
            let mut transform = Transform::at(tree, scale);
            transform.rotation = layout::initial_rotation(rng);
            let p = Particle {
                id: self.alloc_id(), archetype, is_dust: false,
                tree_target: tree, scatter_target: scatter,
                base_scale: scale, spin_rate: spin, transform,
                visual: Default::default(),
            };
            let kind = visual_kind(&archetype).unwrap_or(VisualKind::GreenBox);
            self.push(host, p, kind);
        }

        for _ in 0..cfg.dust_count {
            let archetype = Archetype::Dust;
            let tree      = layout::tree_target(rng, cfg);
            let scatter   = layout::scatter_target(rng, layout::DUST_SHELL);
            let scale     = layout::dust_scale(rng);
            let spin      = layout::spin_rate(rng, &archetype);
            let p = Particle {
                id: self.alloc_id(), archetype, is_dust: true,
                tree_target: tree, scatter_target: scatter,
                base_scale: scale, spin_rate: spin,
                transform: Transform::at(tree, 0.0),
                visual: Default::default(),
            };
            self.push(host, p, VisualKind::Dust);
        }

        for _ in 0..cfg.snowflake_count {
            let (pos, motion, scale) = layout::snowflake_spawn(rng);
            let archetype = Archetype::Snowflake(motion);
            let p = Particle {
                id: self.alloc_id(), archetype, is_dust: false,
                tree_target: pos, scatter_target: pos,
                base_scale: scale, spin_rate: glam::Vec3::ZERO,
                transform: Transform::at(pos, scale),
                visual: Default::default(),
            };
            self.push(host, p, VisualKind::Snowflake);
        }

        log::info!(
            "[scene] populated {} ornaments, {} dust, {} snowflakes",
            cfg.ornament_count, cfg.dust_count, cfg.snowflake_count,
        );
    }

    /// Add one photo card showing `texture`.
    pub fn add_photo<R, H>(
        &mut self,
        texture: Arc<PhotoTexture>,
        kind:    PhotoKind,
        cfg:     &SceneConfig,
        rng:     &mut R,
        host:    &mut H,
    ) -> ParticleId
    where
        R: Rng + ?Sized,
        H: SceneHost + ?Sized,
    {
        let archetype = Archetype::Photo(kind);
        let tree      = layout::tree_target(rng, cfg);
        let scatter   = layout::scatter_target(rng, layout::ORNAMENT_SHELL);
        let spin      = layout::spin_rate(rng, &archetype);
        let p = Particle {
            id: self.alloc_id(), archetype, is_dust: false,
            tree_target: tree, scatter_target: scatter,
            base_scale: PHOTO_BASE_SCALE, spin_rate: spin,
            transform: Transform::at(tree, PHOTO_BASE_SCALE),
            visual: Default::default(),
        };
        self.push(host, p, VisualKind::Photo(texture))
    }

    /// Remove the placeholder card if it is still present. Returns whether
    /// anything was removed; calling it again is a no-op.
    pub fn remove_placeholder_photo<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let Some(idx) = self
            .particles
            .iter()
            .position(|p| p.archetype == Archetype::Photo(PhotoKind::Placeholder))
        else {
            return false;
        };
        let p = self.particles.remove(idx);
        host.remove_object(p.visual);
        log::debug!("[scene] placeholder photo {:?} removed", p.id);
        true
    }

    /// Drop every particle and release its visual.
    pub fn release_all<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        for p in self.particles.drain(..) {
            host.remove_object(p.visual);
        }
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.particles[i])
    }

    pub fn contains(&self, id: ParticleId) -> bool { self.get(id).is_some() }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> { self.particles.iter() }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    pub fn len(&self) -> usize { self.particles.len() }

    pub fn is_empty(&self) -> bool { self.particles.is_empty() }

    /// Photo ids in registry order; this order fixes the gallery slots.
    pub fn photo_ids(&self) -> Vec<ParticleId> {
        self.particles.iter().filter(|p| p.is_photo()).map(|p| p.id).collect()
    }

    pub fn count_photos(&self) -> usize {
        self.particles.iter().filter(|p| p.is_photo()).count()
    }

    pub fn has_placeholder(&self) -> bool {
        self.particles
            .iter()
            .any(|p| p.archetype == Archetype::Photo(PhotoKind::Placeholder))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
