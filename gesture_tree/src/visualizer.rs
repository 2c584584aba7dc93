//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ controls legend (H)          MERRY CHRISTMAS                     │
//! │                                                                  │
//! │                        ▲  star                                   │
//! │                      particle tree                               │
//! │                     (painter's order)                            │
//! │                                                                  │
//! │ ┌ status ────────────┐                          ┌ webcam ──────┐ │
//! │ │ MODE               │                          │  skeleton    │ │
//! │ │ hint               │                          │  (mirrored)  │ │
//! │ └────────────────────┘                          └──────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scene half implements [`SceneHost`]: the controller registers each
//! visual once and then hands over world transforms every tick. The overlay
//! half is drawn on top by the app before [`Visualizer::present`].

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::time::Duration;

use glam::{Vec2, Vec3};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use hand_gesture::{AppMode, HandPose, HandState, HAND_CONNECTIONS};
use tree_scene::{
    FocusBlur, FrameView, PhotoTexture, RenderItem, SceneError, SceneHost, VisualDesc,
    VisualHandle, VisualKind,
};

use crate::gesture::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 1024;
pub const WIN_H:      usize = 640;
const FOV_Y_DEG:      f32   = 42.0;
const NEAR:           f32   = 0.1;
const CAM_W:          usize = 192;
const CAM_H:          usize = 144;
const MARGIN:         usize = 16;
const BG_COLOR:       u32   = 0xFF000000;
const BANNER_H:       usize = 40;
const PANEL_BG:       u32   = 0xE0101010;
const TEXT_COLOR:     u32   = 0xFFEEEEEE;
const DIM_TEXT:       u32   = 0xFF888888;

const GOLD:           u32   = 0xFFFFD966;
const GREEN:          u32   = 0xFF0E5A28;
const RED:            u32   = 0xFFB3121A;
const CANE_WHITE:     u32   = 0xFFFFFFFF;
const DUST_COLOR:     u32   = 0xFFFFEEBB;
const SNOW_COLOR:     u32   = 0xFFFFFFFF;
const STAR_COLOR:     u32   = 0xFFFFDD88;
const BONE_COLOR:     u32   = 0xFF00FF88;
const JOINT_COLOR:    u32   = 0xFFFF3355;

/// How strongly distance from the focal plane darkens a sprite.
const DIM_GAIN:       f32   = 5.0;
const MAX_DIM:        f32   = 0.6;

// Half-extents in world units.
const BOX_HALF:       f32   = 0.275;
const SPHERE_RADIUS:  f32   = 0.5;
const CANE_HALF:      f32   = 0.5;
const DUST_RADIUS:    f32   = 0.08;
const SNOW_RADIUS:    f32   = 0.4;
const STAR_RADIUS:    f32   = 1.2;
const FRAME_HALF:     f32   = 0.7;
const IMAGE_HALF:     f32   = 0.6;

const CONTROLS: [&str; 7] = [
    "F FIST   O OPEN PALM",
    "P PEACE  C PINCH",
    "R RELAX  N NO HAND",
    "MOUSE    MOVE HAND",
    "1-4      SELECT MODE",
    "H        HIDE CONTROLS",
    "Q/ESC    QUIT",
];

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Pinhole camera looking down −Z.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    camera: Vec3,
    focal:  f32,
    center: Vec2,
}

impl Projection {
    pub fn new(camera: Vec3, width: usize, height: usize) -> Self {
        let focal = (height.max(1) as f32 * 0.5) / (FOV_Y_DEG.to_radians() * 0.5).tan();
        Projection { camera, focal, center: Vec2::new(width as f32 * 0.5, height as f32 * 0.5) }
    }

    /// Screen position and view depth; `None` behind the near plane.
    pub fn project(&self, p: Vec3) -> Option<(Vec2, f32)> {
        let v = p - self.camera;
        let depth = -v.z;
        if !(depth > NEAR) {
            return None;
        }
        let s = self.focal / depth;
        Some((Vec2::new(self.center.x + v.x * s, self.center.y - v.y * s), depth))
    }

    /// Screen size of a world length at `depth`.
    pub fn pixels(&self, world: f32, depth: f32) -> f32 {
        world * self.focal / depth
    }
}

/// Fraction a sprite is pulled toward the background by defocus.
pub fn dim_for(depth: f32, blur: &FocusBlur) -> f32 {
    ((depth - blur.focus).abs() * blur.max_blur * DIM_GAIN).clamp(0.0, MAX_DIM)
}

// ════════════════════════════════════════════════════════════════════════════
// Per-frame inputs and overlay data
// ════════════════════════════════════════════════════════════════════════════

/// What the window asked for this frame, beyond simulated hand input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub quit:   bool,
    /// Direct mode selection (keys 1–4).
    pub select: Option<AppMode>,
}

/// Everything the overlay shows.
pub struct Hud<'a> {
    pub mode:         AppMode,
    pub hand:         &'a HandState,
    pub assets_ready: bool,
    pub photo_count:  usize,
    pub connected:    bool,
}

struct Sprite {
    depth:  f32,
    screen: Vec2,
    item:   RenderItem,
    kind:   VisualKind,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:        Window,
    buf:           Vec<u32>,
    width:         usize,
    height:        usize,
    sim_tx:        Sender<SimInput>,

    visuals:       HashMap<VisualHandle, VisualDesc>,
    next_handle:   u64,
    sprites:       Vec<Sprite>,

    show_controls: bool,
    last_pointer:  Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, width: usize, height: usize) -> Result<Self, SceneError> {
        let (width, height) = (width.max(CAM_W + 2 * MARGIN), height.max(CAM_H + 2 * MARGIN));
        let mut window = Window::new(
            "Gesture Tree — Merry Christmas",
            width, height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        ).map_err(|e| SceneError::HostInit(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            sim_tx,
            visuals: HashMap::new(),
            next_handle: 1,
            sprites: Vec::new(),
            show_controls: true,
            last_pointer: None,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Current client size; differs from the buffer size after a resize.
    pub fn window_size(&self) -> (usize, usize) { self.window.get_size() }

    pub fn buffer_size(&self) -> (usize, usize) { (self.width, self.height) }

    /// Poll keyboard and mouse, forwarding hand input to the simulated source.
    pub fn poll_input(&mut self) -> FrameInput {
        let mut input = FrameInput::default();
        if !self.window.is_open() {
            input.quit = true;
            return input;
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            input.quit = true;
            return input;
        }

        let pose = if one_shot(Key::F) {
            Some(Some(HandPose::Fist))
        } else if one_shot(Key::O) {
            Some(Some(HandPose::OpenPalm))
        } else if one_shot(Key::P) {
            Some(Some(HandPose::Peace))
        } else if one_shot(Key::C) {
            Some(Some(HandPose::Pinch))
        } else if one_shot(Key::R) {
            Some(Some(HandPose::Relaxed))
        } else if one_shot(Key::N) {
            Some(None)
        } else {
            None
        };
        if let Some(p) = pose {
            let _ = self.sim_tx.send(SimInput::Pose(p));
        }

        for (key, mode) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4].into_iter().zip(AppMode::ALL) {
            if one_shot(key) {
                input.select = Some(mode);
            }
        }

        if one_shot(Key::H) {
            self.show_controls = !self.show_controls;
        }

        let (w, h) = self.window.get_size();
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
            let p = (mx / w.max(1) as f32, my / h.max(1) as f32);
            if self.last_pointer != Some(p) {
                self.last_pointer = Some(p);
                let _ = self.sim_tx.send(SimInput::Pointer { x: p.0, y: p.1 });
            }
        }

        input
    }

    /// Draw the HUD over the last rendered scene.
    pub fn draw_overlay(&mut self, hud: &Hud<'_>) {
        let (w, h) = (self.width, self.height);

        // ── Title ─────────────────────────────────────────────────────────
        let title = "MERRY CHRISTMAS";
        let scale = if w >= 800 { 4 } else { 2 };
        let tx = w.saturating_sub(text_width(title, scale)) / 2;
        self.draw_text(title, tx, MARGIN, scale, GOLD);

        // ── Controls legend ───────────────────────────────────────────────
        if self.show_controls {
            let lh = 7 * 2;
            let box_h = CONTROLS.len() * lh + 12;
            self.blend_rect(MARGIN, MARGIN + 48, 190, box_h, PANEL_BG);
            for (i, line) in CONTROLS.iter().enumerate() {
                self.draw_text(line, MARGIN + 8, MARGIN + 54 + i * lh, 2, DIM_TEXT);
            }
        }

        // ── Mode status ───────────────────────────────────────────────────
        let sy = h.saturating_sub(MARGIN + 80);
        self.blend_rect(MARGIN, sy, 300, 80, PANEL_BG);
        self.draw_border(MARGIN, sy, 300, 80, GOLD);
        self.draw_text(hud.mode.name(), MARGIN + 12, sy + 12, 4, GOLD);
        self.draw_text(hud.mode.hint(), MARGIN + 12, sy + 44, 2, TEXT_COLOR);
        let detail = format!("PHOTOS: {}", hud.photo_count);
        self.draw_text(&detail, MARGIN + 12, sy + 62, 2, DIM_TEXT);

        // ── Webcam panel ──────────────────────────────────────────────────
        let cx = w.saturating_sub(MARGIN + CAM_W);
        let cy = h.saturating_sub(MARGIN + CAM_H);
        self.draw_webcam(cx, cy, hud);

        // ── Loading banner ────────────────────────────────────────────────
        if !hud.assets_ready {
            let msg = "LOADING HOLIDAY MAGIC...";
            let bw = text_width(msg, 3) + 40;
            let (bx, by) = banner_origin(w, h, bw, BANNER_H);
            self.blend_rect(bx, by, bw, BANNER_H, PANEL_BG);
            self.draw_text(msg, bx + 20, by + 12, 3, GOLD);
        }
    }

    pub fn present(&mut self) {
        self.window.update_with_buffer(&self.buf, self.width, self.height).ok();
    }

    // ── Webcam ────────────────────────────────────────────────────────────

    fn draw_webcam(&mut self, x: usize, y: usize, hud: &Hud<'_>) {
        self.fill_rect(x, y, CAM_W, CAM_H, 0xFF0A0A0A);
        self.draw_border(x, y, CAM_W, CAM_H, GOLD);

        let label = if hud.connected { "CAMERA" } else { "NO SIGNAL" };
        self.draw_text(label, x + 6, y + 6, 1, DIM_TEXT);

        let Some(lm) = hud.hand.landmarks.as_ref().filter(|_| hud.hand.detected) else {
            self.draw_text("NO HAND", x + CAM_W / 2 - 14, y + CAM_H / 2, 1, DIM_TEXT);
            return;
        };

        // Mirrored so the skeleton moves the way the user does.
        let to_panel = |i: usize| {
            let p = lm.points[i];
            (
                x as isize + ((1.0 - p.x.clamp(0.0, 1.0)) * (CAM_W - 1) as f32) as isize,
                y as isize + (p.y.clamp(0.0, 1.0) * (CAM_H - 1) as f32) as isize,
            )
        };
        for &(a, b) in HAND_CONNECTIONS.iter() {
            let (x0, y0) = to_panel(a);
            let (x1, y1) = to_panel(b);
            self.draw_line(x0, y0, x1, y1, BONE_COLOR);
        }
        for i in 0..lm.points.len() {
            let (px, py) = to_panel(i);
            self.fill_disc(px as f32, py as f32, 2.0, JOINT_COLOR, 1.0);
        }
    }

    // ── Scene sprites ─────────────────────────────────────────────────────

    fn draw_sprite(&mut self, proj: &Projection, camera: Vec3, s: &Sprite, dim: f32) {
        let px = |world: f32| proj.pixels(world * s.item.scale, s.depth);
        let (x, y) = (s.screen.x, s.screen.y);
        // Screen-space spin from the local X axis.
        let axis = {
            let a = s.item.rotation * Vec3::X;
            Vec2::new(a.x, -a.y).try_normalize().unwrap_or(Vec2::X)
        };

        match &s.kind {
            VisualKind::GreenBox  => self.fill_square(x, y, px(BOX_HALF), axis, fade(GREEN, dim)),
            VisualKind::GoldBox   => self.fill_square(x, y, px(BOX_HALF), axis, fade(GOLD, dim)),
            VisualKind::GoldSphere => self.fill_sphere(x, y, px(SPHERE_RADIUS), fade(GOLD, dim)),
            VisualKind::RedSphere  => self.fill_sphere(x, y, px(SPHERE_RADIUS), fade(RED, dim)),
            VisualKind::CandyCane => self.draw_cane(x, y, px(CANE_HALF), axis, dim),
            VisualKind::Dust => {
                let r = px(DUST_RADIUS);
                if r < 1.0 {
                    self.blend_pixel(x as isize, y as isize, fade(DUST_COLOR, dim), 0.8);
                } else {
                    self.fill_disc(x, y, r, fade(DUST_COLOR, dim), 0.8);
                }
            }
            VisualKind::Snowflake => self.draw_flake(x, y, px(SNOW_RADIUS), fade(SNOW_COLOR, dim)),
            VisualKind::Star => {
                let r = px(STAR_RADIUS);
                self.fill_disc(x, y, r * 2.0, STAR_COLOR, 0.15);
                self.fill_diamond(x, y, r, STAR_COLOR);
            }
            VisualKind::Photo(tex) => self.draw_photo(proj, camera, &s.item, tex, dim),
        }
    }

    fn draw_photo(&mut self, proj: &Projection, camera: Vec3, item: &RenderItem, tex: &PhotoTexture, dim: f32) {
        let half = FRAME_HALF * item.scale;
        let right = item.rotation * Vec3::X * half;
        let up    = item.rotation * Vec3::Y * half;
        let (Some((c, _)), Some((r, _)), Some((u, _))) = (
            proj.project(item.position),
            proj.project(item.position + right),
            proj.project(item.position + up),
        ) else {
            return;
        };
        let (a, b) = (r - c, u - c);
        let det = a.x * b.y - a.y * b.x;
        if det.abs() < 1e-3 {
            return; // edge-on
        }

        let front = (item.rotation * Vec3::Z).dot(camera - item.position) > 0.0;
        let inner = IMAGE_HALF / FRAME_HALF;
        let ext_x = a.x.abs() + b.x.abs();
        let ext_y = a.y.abs() + b.y.abs();
        let (x0, x1) = ((c.x - ext_x).floor() as isize, (c.x + ext_x).ceil() as isize);
        let (y0, y1) = ((c.y - ext_y).floor() as isize, (c.y + ext_y).ceil() as isize);

        for py in y0.max(0)..y1.min(self.height as isize) {
            for px in x0.max(0)..x1.min(self.width as isize) {
                let d = Vec2::new(px as f32 + 0.5 - c.x, py as f32 + 0.5 - c.y);
                let s = (d.x * b.y - d.y * b.x) / det;
                let t = (a.x * d.y - a.y * d.x) / det;
                if s.abs() > 1.0 || t.abs() > 1.0 {
                    continue;
                }
                let color = if front && s.abs() <= inner && t.abs() <= inner {
                    tex.sample((s / inner + 1.0) * 0.5, (1.0 - t / inner) * 0.5)
                } else {
                    shade(GOLD, 0.85 + 0.15 * t)
                };
                self.set_pixel(px as usize, py as usize, fade(color, dim));
            }
        }
    }

    fn draw_cane(&mut self, x: f32, y: f32, half: f32, axis: Vec2, dim: f32) {
        let perp = Vec2::new(-axis.y, axis.x);
        let steps = (half * 2.0).ceil().max(1.0) as i32;
        let thick = (half * 0.16).max(0.5);
        for i in -steps..=steps {
            let f = i as f32 / steps as f32;
            let p = Vec2::new(x, y) + perp * (f * half);
            let stripe = ((f + 1.0) * 4.0) as i32 % 2 == 0;
            let color = if stripe { RED } else { CANE_WHITE };
            self.fill_disc(p.x, p.y, thick, fade(color, dim), 1.0);
        }
        // Hook.
        let top = Vec2::new(x, y) - perp * half;
        self.fill_disc(top.x + axis.x * thick * 2.0, top.y + axis.y * thick * 2.0, thick, fade(RED, dim), 1.0);
    }

    fn draw_flake(&mut self, x: f32, y: f32, r: f32, color: u32) {
        let (cx, cy, r) = (x as isize, y as isize, r.max(1.0) as isize);
        self.draw_line(cx - r, cy, cx + r, cy, color);
        self.draw_line(cx, cy - r, cx, cy + r, color);
        let d = r * 7 / 10;
        self.draw_line(cx - d, cy - d, cx + d, cy + d, color);
        self.draw_line(cx - d, cy + d, cx + d, cy - d, color);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// Fill with the alpha byte of `color` as opacity.
    fn blend_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        let alpha = (color >> 24) as f32 / 255.0;
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                let i = row * self.width + col;
                self.buf[i] = blend(self.buf[i], color, alpha);
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(self.width) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(self.height) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    fn blend_pixel(&mut self, x: isize, y: isize, color: u32, alpha: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let i = y as usize * self.width + x as usize;
            self.buf[i] = blend(self.buf[i], color, alpha);
        }
    }

    /// Bresenham line.
    fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            if x >= 0 && y >= 0 {
                self.set_pixel(x as usize, y as usize, color);
            }
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn fill_disc(&mut self, x: f32, y: f32, r: f32, color: u32, alpha: f32) {
        let r = r.max(0.5);
        let (x0, x1) = ((x - r).floor() as isize, (x + r).ceil() as isize);
        let (y0, y1) = ((y - r).floor() as isize, (y + r).ceil() as isize);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let (dx, dy) = (px as f32 + 0.5 - x, py as f32 + 0.5 - y);
                if dx * dx + dy * dy <= r * r {
                    self.blend_pixel(px, py, color, alpha);
                }
            }
        }
    }

    /// Disc lit from the upper left.
    fn fill_sphere(&mut self, x: f32, y: f32, r: f32, color: u32) {
        let r = r.max(0.5);
        let (x0, x1) = ((x - r).floor() as isize, (x + r).ceil() as isize);
        let (y0, y1) = ((y - r).floor() as isize, (y + r).ceil() as isize);
        let light = Vec2::new(x - r * 0.35, y - r * 0.35);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                if p.distance_squared(Vec2::new(x, y)) <= r * r {
                    let f = 1.25 - 0.6 * (p.distance(light) / (2.0 * r)).min(1.0);
                    self.blend_pixel(px, py, shade(color, f), 1.0);
                }
            }
        }
    }

    /// Square of half-side `half`, rotated so its first edge runs along `axis`.
    fn fill_square(&mut self, x: f32, y: f32, half: f32, axis: Vec2, color: u32) {
        let half = half.max(0.5);
        let perp = Vec2::new(-axis.y, axis.x);
        let reach = half * std::f32::consts::SQRT_2;
        let (x0, x1) = ((x - reach).floor() as isize, (x + reach).ceil() as isize);
        let (y0, y1) = ((y - reach).floor() as isize, (y + reach).ceil() as isize);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let d = Vec2::new(px as f32 + 0.5 - x, py as f32 + 0.5 - y);
                let (u, v) = (d.dot(axis), d.dot(perp));
                if u.abs() <= half && v.abs() <= half {
                    let edge = u.abs().max(v.abs()) > half * 0.8;
                    let c = if edge { shade(color, 0.7) } else { shade(color, 1.0 - 0.2 * v / half) };
                    self.blend_pixel(px, py, c, 1.0);
                }
            }
        }
    }

    fn fill_diamond(&mut self, x: f32, y: f32, r: f32, color: u32) {
        let r = r.max(1.0);
        let (x0, x1) = ((x - r).floor() as isize, (x + r).ceil() as isize);
        let (y0, y1) = ((y - r).floor() as isize, (y + r).ceil() as isize);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let (dx, dy) = ((px as f32 + 0.5 - x).abs(), (py as f32 + 0.5 - y).abs());
                if dx + dy <= r {
                    self.blend_pixel(px, py, shade(color, 1.2 - 0.4 * (dx + dy) / r), 1.0);
                }
            }
        }
    }

    /// Minimal bitmap font: 3×5 characters, each pixel drawn `scale`×`scale`.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > self.width { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SceneHost
// ════════════════════════════════════════════════════════════════════════════

impl SceneHost for Visualizer {
    fn add_object(&mut self, desc: &VisualDesc) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(handle, desc.clone());
        handle
    }

    fn remove_object(&mut self, handle: VisualHandle) {
        self.visuals.remove(&handle);
    }

    fn render_frame(&mut self, frame: &FrameView<'_>) {
        self.buf.fill(BG_COLOR);
        let proj = Projection::new(frame.camera, self.width, self.height);

        let mut sprites = std::mem::take(&mut self.sprites);
        sprites.clear();
        for item in frame.items {
            let Some(desc) = self.visuals.get(&item.handle) else { continue };
            if let Some((screen, depth)) = proj.project(item.position) {
                sprites.push(Sprite { depth, screen, item: *item, kind: desc.kind.clone() });
            }
        }
        // Far to near.
        sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        for s in &sprites {
            let dim = dim_for(s.depth, &frame.blur);
            self.draw_sprite(&proj, frame.camera, s, dim);
        }
        self.sprites = sprites;
    }

    fn resize(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.buf = vec![BG_COLOR; width * height];
        log::debug!("[window] resized to {}x{}", width, height);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale
}

/// Top-left corner that centres a `bw`×`bh` box, pinned to 0 when the
/// window is smaller than the box.
fn banner_origin(w: usize, h: usize, bw: usize, bh: usize) -> (usize, usize) {
    (w.saturating_sub(bw) / 2, h.saturating_sub(bh) / 2)
}

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

/// Scale brightness, saturating at white.
fn shade(c: u32, f: f32) -> u32 {
    let f = f.max(0.0);
    let ch = |shift: u32| (((c >> shift) & 0xFF) as f32 * f).min(255.0) as u32;
    0xFF000000 | (ch(16) << 16) | (ch(8) << 8) | ch(0)
}

/// Pull toward the background by `dim`.
fn fade(c: u32, dim: f32) -> u32 {
    blend(c, BG_COLOR, dim)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
