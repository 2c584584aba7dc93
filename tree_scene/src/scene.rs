//! Animation Loop.
//!
//! `SceneController` owns the registry and the render host and advances the
//! whole scene by one frame per [`SceneController::tick`]. It spawns no
//! threads and keeps no clock: the caller supplies `dt`, which keeps ticks
//! reproducible in tests.

use std::sync::Arc;

use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hand_gesture::{AppMode, HandState};

use crate::blend::{approach, approach_vec3};
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::focus_blur::FocusBlur;
use crate::formation::{self, FormationContext, SCALE_LERP_RATE};
use crate::host::{FrameView, Layer, RenderItem, SceneHost, VisualDesc, VisualKind};
use crate::layout;
use crate::particle::{Archetype, ParticleId, PhotoKind, VisualHandle};
use crate::photo::{photo_channel, PhotoInbox, PhotoLoader, PhotoTexture};
use crate::registry::ParticleRegistry;

const TREE_YAW_SPIN:  f32 = 0.5;
const SNOW_ROLL_RATE: f32 = 0.5;

/// Mode-level state the loop carries between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneState {
    pub mode:         AppMode,
    /// Held fixed from entering `Focus` until the mode changes.
    pub focus_target: Option<ParticleId>,
    pub rotation:     crate::rotation::RotationState,
}

pub struct SceneController<H: SceneHost> {
    config:      SceneConfig,
    host:        H,
    registry:    ParticleRegistry,
    rng:         StdRng,
    state:       SceneState,
    blur:        FocusBlur,
    elapsed:     f32,
    star:        VisualHandle,
    inbox:       PhotoInbox,
    loader:      PhotoLoader,
    frame_items: Vec<RenderItem>,
    ready:       bool,
    ready_seen:  bool,
    shut_down:   bool,
}

impl<H: SceneHost> SceneController<H> {
    /// Build the full particle population on `host`. Fails before any
    /// object is created if the host has nothing to draw on.
    pub fn new(config: SceneConfig, mut host: H) -> Result<Self, SceneError> {
        host.ensure_available()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        let mut registry = ParticleRegistry::new();
        registry.populate(&config, &mut rng, &mut host);
        if config.placeholder_photo {
            let tex = Arc::new(PhotoTexture::placeholder());
            registry.add_photo(tex, PhotoKind::Placeholder, &config, &mut rng, &mut host);
        }
        let star = host.add_object(&VisualDesc { kind: VisualKind::Star, layer: Layer::Group });

        let (loader, inbox) = photo_channel();
        let frame_items = Vec::with_capacity(registry.len() + 1);

        log::info!("[scene] ready to animate {} particles", registry.len());

        Ok(SceneController {
            config,
            host,
            registry,
            rng,
            state: SceneState::default(),
            blur: FocusBlur::default(),
            elapsed: 0.0,
            star,
            inbox,
            loader,
            frame_items,
            ready: false,
            ready_seen: false,
            shut_down: false,
        })
    }

    // ── Mode control ──────────────────────────────────────────────────────

    /// Switch formation. Entering `Focus` picks a random photo to pull
    /// forward; leaving it lets the photo go.
    pub fn set_mode(&mut self, mode: AppMode) {
        if mode == self.state.mode {
            return;
        }
        self.state.mode = mode;
        self.state.focus_target = if mode == AppMode::Focus {
            let photos = self.registry.photo_ids();
            if photos.is_empty() {
                None
            } else {
                Some(photos[self.rng.gen_range(0..photos.len())])
            }
        } else {
            None
        };
        log::debug!("[scene] mode {} (focus {:?})", mode, self.state.focus_target);
    }

    pub fn mode(&self) -> AppMode { self.state.mode }

    pub fn focus_target(&self) -> Option<ParticleId> { self.state.focus_target }

    pub fn state(&self) -> &SceneState { &self.state }

    pub fn blur(&self) -> FocusBlur { self.blur }

    pub fn elapsed(&self) -> f32 { self.elapsed }

    // ── Photos ────────────────────────────────────────────────────────────

    /// Handle for loading photos from other threads; they appear on the
    /// next tick.
    pub fn photo_loader(&self) -> PhotoLoader { self.loader.clone() }

    /// Insert a decoded photo now, retiring the placeholder first.
    pub fn add_photo(&mut self, texture: PhotoTexture) -> ParticleId {
        self.remove_placeholder_photo();
        let id = self.registry.add_photo(
            Arc::new(texture),
            PhotoKind::Supplied,
            &self.config,
            &mut self.rng,
            &mut self.host,
        );
        log::info!("[scene] photo {:?} added ({} total)", id, self.registry.count_photos());
        id
    }

    pub fn remove_placeholder_photo(&mut self) -> bool {
        self.registry.remove_placeholder_photo(&mut self.host)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: usize, height: usize) {
        self.host.resize(width, height);
    }

    /// True once the setup latency has elapsed in scene time.
    pub fn is_ready(&self) -> bool { self.ready }

    /// Returns true exactly once, on the first call after becoming ready.
    pub fn poll_ready(&mut self) -> bool {
        if self.ready && !self.ready_seen {
            self.ready_seen = true;
            return true;
        }
        false
    }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn registry(&self) -> &ParticleRegistry { &self.registry }

    pub fn config(&self) -> &SceneConfig { &self.config }

    /// Release every visual. Ticks after this do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.registry.release_all(&mut self.host);
        self.host.remove_object(self.star);
        log::info!("[scene] shut down");
    }

    // ── Frame ─────────────────────────────────────────────────────────────

    /// Advance the scene by `dt` seconds and submit one frame.
    pub fn tick(&mut self, dt: f32, hand: &HandState) {
        if self.shut_down {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        for texture in self.inbox.drain() {
            self.add_photo(texture);
        }

        let mode = self.state.mode;
        self.state.rotation.update(mode, hand, dt);
        self.blur.update(mode, dt);

        if let Some(id) = self.state.focus_target {
            if !self.registry.contains(id) {
                self.state.focus_target = None;
            }
        }

        let group     = self.state.rotation.group_quat();
        let group_inv = group.inverse();
        let camera    = self.config.camera_position;
        let photo_ids = self.registry.photo_ids();
        let ctx = FormationContext {
            mode,
            focus:          self.state.focus_target,
            focus_local:    group_inv * self.config.focus_point,
            photo_slots:    &photo_ids,
            gallery_radius: self.config.gallery_radius,
            elapsed:        self.elapsed,
        };

        let mut items = std::mem::take(&mut self.frame_items);
        items.clear();

        let elapsed = self.elapsed;
        let rng = &mut self.rng;
        for p in self.registry.iter_mut() {
            if let Archetype::Snowflake(m) = p.archetype {
                let tf = &mut p.transform;
                tf.position.y -= m.fall_speed * dt;
                tf.position.x  = m.initial_x + (elapsed * m.sway_speed).sin() * m.sway_amount;
                tf.rotation.z += SNOW_ROLL_RATE * dt;
                if tf.position.y < layout::SNOW_FLOOR {
                    tf.position.y = layout::snowflake_respawn_height(rng);
                }
                items.push(RenderItem {
                    handle:   p.visual,
                    position: tf.position,
                    rotation: euler_quat(tf.rotation),
                    scale:    tf.scale,
                });
                continue;
            }

            let target = formation::resolve(p, &ctx);
            let tf = &mut p.transform;
            tf.position = approach_vec3(tf.position, target.position, target.lerp_rate, dt);

            match mode {
                AppMode::Scatter => tf.rotation += p.spin_rate * dt,
                AppMode::Tree => {
                    tf.rotation.x  = approach(tf.rotation.x, 0.0, 1.0, dt);
                    tf.rotation.z  = approach(tf.rotation.z, 0.0, 1.0, dt);
                    tf.rotation.y += TREE_YAW_SPIN * dt;
                }
                _ => {}
            }

            let world_pos = group * tf.position;
            if target.face_camera {
                if let Some(q_world) = formation::facing(world_pos, camera) {
                    let (x, y, z) = (group_inv * q_world).to_euler(EulerRot::XYZ);
                    tf.rotation = Vec3::new(x, y, z);
                }
            }

            tf.scale = approach(tf.scale, target.scale, SCALE_LERP_RATE, dt);

            items.push(RenderItem {
                handle:   p.visual,
                position: world_pos,
                rotation: group * euler_quat(tf.rotation),
                scale:    tf.scale,
            });
        }

        items.push(RenderItem {
            handle:   self.star,
            position: group * self.config.star_position(),
            rotation: group,
            scale:    1.0,
        });

        if !self.ready && self.elapsed >= self.config.setup_latency {
            self.ready = true;
            log::info!("[scene] assets ready after {:.2}s", self.elapsed);
        }

        self.host.render_frame(&FrameView {
            camera,
            group_rotation: group,
            blur:           self.blur,
            items:          &items,
            elapsed:        self.elapsed,
            assets_ready:   self.ready,
        });
        self.frame_items = items;
    }
}

impl<H: SceneHost> Drop for SceneController<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn euler_quat(r: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;
    use crate::particle::SnowflakeMotion;

    const DT: f32 = 1.0 / 60.0;

    fn small(placeholder: bool) -> SceneConfig {
        let mut cfg = SceneConfig::default().with_counts(40, 40, 20).with_seed(42);
        cfg.placeholder_photo = placeholder;
        cfg
    }

    fn photo() -> PhotoTexture {
        PhotoTexture::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255])
    }

    fn run(scene: &mut SceneController<HeadlessHost>, frames: usize) {
        let hand = HandState::default();
        for _ in 0..frames {
            scene.tick(DT, &hand);
        }
    }

    #[test]
    fn unavailable_host_is_fatal() {
        let r = SceneController::new(small(true), HeadlessHost::unavailable());
        assert!(matches!(r, Err(SceneError::HostInit(_))));
    }

    #[test]
    fn starts_in_tree_with_placeholder() {
        let scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        assert_eq!(scene.mode(), AppMode::Tree);
        assert_eq!(scene.registry().count_photos(), 1);
        assert!(scene.registry().has_placeholder());
        // particles + placeholder + star
        assert_eq!(scene.host().live_count(), 40 + 40 + 20 + 1 + 1);
    }

    #[test]
    fn supplying_n_photos_yields_n_photo_particles() {
        let mut scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        for _ in 0..5 {
            scene.add_photo(photo());
        }
        assert_eq!(scene.registry().count_photos(), 5);
        assert!(!scene.registry().has_placeholder());
        assert_eq!(scene.host().live_photo_count(), 5);
        assert!(!scene.remove_placeholder_photo());
    }

    #[test]
    fn focus_with_no_photos_falls_back_to_scatter() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        scene.set_mode(AppMode::Focus);
        assert_eq!(scene.focus_target(), None);
        run(&mut scene, 900);
        for p in scene.registry().iter().filter(|p| !matches!(p.archetype, Archetype::Snowflake(_))) {
            assert!(p.transform.position.distance(p.scatter_target) < 1e-2);
        }
    }

    #[test]
    fn focus_target_is_held_until_mode_changes() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        let ids: Vec<_> = (0..3).map(|_| scene.add_photo(photo())).collect();
        scene.set_mode(AppMode::Focus);
        let target = scene.focus_target().unwrap();
        assert!(ids.contains(&target));

        scene.set_mode(AppMode::Focus);
        assert_eq!(scene.focus_target(), Some(target));

        scene.set_mode(AppMode::Scatter);
        assert_eq!(scene.focus_target(), None);
    }

    #[test]
    fn focused_photo_flies_to_focus_point() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        scene.add_photo(photo());
        scene.set_mode(AppMode::Focus);
        run(&mut scene, 600);

        let id = scene.focus_target().unwrap();
        let handle = scene.registry().get(id).unwrap().visual();
        let item = *scene.host().item(handle).unwrap();
        assert!(item.position.distance(scene.config().focus_point) < 1.5, "{:?}", item.position);
        assert!((item.scale - formation::FOCUS_SCALE).abs() < 1e-2);
        // Front face (+Z) points at the camera.
        let forward = item.rotation * Vec3::Z;
        let to_cam  = (scene.config().camera_position - item.position).normalize();
        assert!(forward.dot(to_cam) > 0.99);
    }

    #[test]
    fn tree_hides_dust() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        run(&mut scene, 600);
        assert!(scene.registry().iter().filter(|p| p.is_dust).all(|p| p.transform.scale < 1e-3));
    }

    #[test]
    fn snowflakes_keep_falling_and_wrap() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        let hand = HandState::default();
        for _ in 0..200 {
            scene.tick(0.5, &hand);
            for p in scene.registry().iter() {
                if let Archetype::Snowflake(_) = p.archetype {
                    assert!(p.transform.position.y >= layout::SNOW_FLOOR - 1.0);
                }
            }
        }
    }

    /// Rotation and spin of every particle that is neither a photo nor snow.
    fn ornaments(scene: &SceneController<HeadlessHost>) -> Vec<(Vec3, Vec3)> {
        scene
            .registry()
            .iter()
            .filter(|p| !p.is_photo() && !matches!(p.archetype, Archetype::Snowflake(_)))
            .map(|p| (p.transform.rotation, p.spin_rate))
            .collect()
    }

    fn snowflakes(scene: &SceneController<HeadlessHost>) -> Vec<(Vec3, Vec3, SnowflakeMotion)> {
        scene
            .registry()
            .iter()
            .filter_map(|p| match p.archetype {
                Archetype::Snowflake(m) => Some((p.transform.position, p.transform.rotation, m)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn scatter_spins_ornaments_at_their_own_rate() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        scene.set_mode(AppMode::Scatter);
        let before = ornaments(&scene);
        assert_eq!(before.len(), 80);
        run(&mut scene, 1);
        for ((r0, spin), (r1, _)) in before.iter().zip(ornaments(&scene)) {
            assert!((r1 - *r0 - *spin * DT).abs().max_element() < 1e-5, "{:?} -> {:?}", r0, r1);
        }
    }

    #[test]
    fn tree_levels_ornaments_and_turns_them_about_y() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        scene.set_mode(AppMode::Scatter);
        run(&mut scene, 30);
        scene.set_mode(AppMode::Tree);

        let before = ornaments(&scene);
        run(&mut scene, 1);
        for ((r0, _), (r1, _)) in before.iter().zip(ornaments(&scene)) {
            assert!((r1.x - r0.x * (1.0 - DT)).abs() < 1e-5);
            assert!((r1.z - r0.z * (1.0 - DT)).abs() < 1e-5);
            assert!(r1.x.abs() <= r0.x.abs() && r1.z.abs() <= r0.z.abs());
            assert!((r1.y - r0.y - TREE_YAW_SPIN * DT).abs() < 1e-5);
        }
    }

    #[test]
    fn snowflakes_sway_about_their_origin() {
        let mut scene = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        let start = snowflakes(&scene);
        run(&mut scene, 45);
        let t = scene.elapsed();
        for ((_, r0, _), (pos, r1, m)) in start.iter().zip(snowflakes(&scene)) {
            let x = m.initial_x + (t * m.sway_speed).sin() * m.sway_amount;
            assert!((pos.x - x).abs() < 1e-4, "{} vs {}", pos.x, x);
            assert!((r1.z - r0.z - SNOW_ROLL_RATE * t).abs() < 1e-4);
        }
    }

    #[test]
    fn snowfall_ignores_mode() {
        let mut tree    = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        let mut gallery = SceneController::new(small(false), HeadlessHost::new()).unwrap();
        gallery.set_mode(AppMode::Gallery);
        run(&mut tree, 120);
        run(&mut gallery, 120);
        assert_eq!(snowflakes(&tree), snowflakes(&gallery));
    }

    #[test]
    fn zero_dt_leaves_positions_alone() {
        let mut scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        let formed = |s: &SceneController<HeadlessHost>| -> Vec<Vec3> {
            s.registry()
                .iter()
                .filter(|p| !matches!(p.archetype, Archetype::Snowflake(_)))
                .map(|p| p.transform.position)
                .collect()
        };
        let before = formed(&scene);
        scene.set_mode(AppMode::Scatter);
        scene.tick(0.0, &HandState::default());
        let after = formed(&scene);
        assert_eq!(before, after);
    }

    #[test]
    fn ready_signal_fires_once_after_latency() {
        let mut scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        run(&mut scene, 30);
        assert!(!scene.is_ready());
        assert!(!scene.poll_ready());
        run(&mut scene, 40);
        assert!(scene.is_ready());
        assert!(scene.poll_ready());
        assert!(!scene.poll_ready());
    }

    #[test]
    fn loader_photos_arrive_on_next_tick() {
        let mut scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        let loader = scene.photo_loader();
        let handle = std::thread::spawn(move || loader.submit(photo()));
        assert!(handle.join().unwrap().is_ok());

        assert!(scene.registry().has_placeholder());
        scene.tick(DT, &HandState::default());
        assert!(!scene.registry().has_placeholder());
        assert_eq!(scene.registry().count_photos(), 1);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        run(&mut scene, 3);
        scene.shutdown();
        assert_eq!(scene.host().live_count(), 0);
        let frames = scene.host().frames;
        scene.tick(DT, &HandState::default());
        assert_eq!(scene.host().frames, frames);
    }

    #[test]
    fn every_frame_renders_each_particle_and_the_star() {
        let mut scene = SceneController::new(small(true), HeadlessHost::new()).unwrap();
        run(&mut scene, 1);
        assert_eq!(scene.host().frames, 1);
        assert_eq!(scene.host().last_items.len(), scene.registry().len() + 1);
    }
}
