//! Top-level application.
//!
//! `App` owns the `GesturePipeline`, the `SceneController` and the mode
//! sink. Once per display frame it drains gestures, applies at most one mode
//! change (chiming once), then advances the scene. [`run`] wraps it in the
//! `minifb` window loop.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::Context;

use hand_gesture::{
    spawn_landmark_source, AppMode, DetectionFrame, DetectorProcess, GesturePipeline,
    GestureThresholds, ModeChange,
};
use tree_scene::{ImageSource, PhotoLoader, SceneConfig, SceneController, SceneError, SceneHost};

use crate::chime::{Chime, ModeSink, Silent};
use crate::gesture::{SimHandSource, SimInput};
use crate::visualizer::{Hud, Visualizer, WIN_H, WIN_W};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where hand landmarks come from.
#[derive(Clone, Debug, PartialEq)]
pub enum HandInput {
    /// Keyboard poses and the mouse pointer.
    Simulated,
    /// External detector printing `READY` then JSON detections.
    Detector { program: String, args: Vec<String> },
    #[cfg(feature = "leap")]
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub scene:      SceneConfig,
    pub thresholds: GestureThresholds,
    pub hand_input: HandInput,
    /// Paths or URLs, in the order given.
    pub photos:     Vec<String>,
    pub photos_dir: Option<PathBuf>,
    pub audio:      bool,
    pub width:      usize,
    pub height:     usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            scene:      SceneConfig::default(),
            thresholds: GestureThresholds::default(),
            hand_input: HandInput::Simulated,
            photos:     Vec::new(),
            photos_dir: None,
            audio:      true,
            width:      WIN_W,
            height:     WIN_H,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App<H: SceneHost> {
    pipeline: GesturePipeline,
    scene:    SceneController<H>,
    sink:     Box<dyn ModeSink>,
}

impl<H: SceneHost> App<H> {
    pub fn new(pipeline: GesturePipeline, scene: SceneController<H>, sink: Box<dyn ModeSink>) -> Self {
        App { pipeline, scene, sink }
    }

    pub fn scene(&self) -> &SceneController<H> { &self.scene }

    pub fn scene_mut(&mut self) -> &mut SceneController<H> { &mut self.scene }

    pub fn pipeline(&self) -> &GesturePipeline { &self.pipeline }

    pub fn mode(&self) -> AppMode { self.scene.mode() }

    /// Switch mode directly. Returns false (and stays silent) if already there.
    pub fn select_mode(&mut self, mode: AppMode) -> bool {
        let from = self.scene.mode();
        if mode == from {
            return false;
        }
        self.scene.set_mode(mode);
        self.sink.mode_changed(mode);
        log::info!("[app] {} → {}", from, mode);
        true
    }

    /// Classify one detection outside the channel and apply its mode change.
    pub fn feed(&mut self, frame: &DetectionFrame) -> Option<ModeChange> {
        let change = self.pipeline.feed(frame, self.scene.mode());
        if let Some(c) = change {
            self.select_mode(c.to);
        }
        change
    }

    /// One display frame: pump gestures, apply the net mode change, tick.
    pub fn frame(&mut self, dt: f32) -> Option<ModeChange> {
        let change = self.pipeline.pump(self.scene.mode());
        if let Some(c) = change {
            self.select_mode(c.to);
        }
        self.scene.tick(dt, self.pipeline.hand());
        if self.scene.poll_ready() {
            log::info!("[app] assets ready");
        }
        change
    }
}

impl App<Visualizer> {
    fn draw_overlay(&mut self) {
        let mode         = self.scene.mode();
        let assets_ready = self.scene.is_ready();
        let photo_count  = self.scene.registry().count_photos();
        let hud = Hud {
            mode,
            hand: self.pipeline.hand(),
            assets_ready,
            photo_count,
            connected: self.pipeline.is_connected(),
        };
        let vis = self.scene.host_mut();
        vis.draw_overlay(&hud);
        vis.present();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Photos
// ════════════════════════════════════════════════════════════════════════════

/// Resolve `--photo` entries and the contents of `--photos-dir` into image
/// sources, each key at most once. Directory entries are sorted by name.
pub fn photo_sources(photos: &[String], dir: Option<&Path>) -> Vec<ImageSource> {
    let mut sources: Vec<ImageSource> = photos.iter().map(|p| ImageSource::from(p.as_str())).collect();

    if let Some(dir) = dir {
        match fs::read_dir(dir) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_image_file(p))
                    .collect();
                found.sort();
                sources.extend(found.into_iter().map(ImageSource::Path));
            }
            Err(e) => log::warn!("[photo] cannot read {}: {}", dir.display(), e),
        }
    }

    let mut seen = HashSet::new();
    sources.retain(|s| match s.key() {
        Some(k) => seen.insert(k),
        None    => true,
    });
    sources
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load `sources` one after another on a background thread. Failures are
/// logged and skipped; the thread stops early once the scene is gone.
/// Yields the number of photos handed to the scene.
pub fn spawn_photo_loader(loader: PhotoLoader, sources: Vec<ImageSource>) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut loaded = 0;
        for source in sources {
            let label = source.key().unwrap_or_else(|| "<bytes>".to_string());
            match loader.load(source) {
                Ok(()) => loaded += 1,
                Err(SceneError::SceneClosed) => break,
                Err(e) => log::warn!("[photo] skipping {}: {}", label, e),
            }
        }
        loaded
    })
}

// ════════════════════════════════════════════════════════════════════════════
// run(): top-level event loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // ── Hand source ───────────────────────────────────────────────────────
    // The pipeline owns the detector handle, so every return path below
    // stops the child and releases the camera.
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let pipeline = match &cfg.hand_input {
        HandInput::Simulated => {
            GesturePipeline::new(spawn_landmark_source(SimHandSource { rx: sim_rx }), cfg.thresholds)
        }
        HandInput::Detector { program, args } => {
            let detector = DetectorProcess::spawn(program, args)
                .with_context(|| format!("starting hand detector `{}`", program))?;
            let handle = detector.handle();
            GesturePipeline::new(spawn_landmark_source(detector), cfg.thresholds).with_detector(handle)
        }
        #[cfg(feature = "leap")]
        HandInput::Leap => {
            GesturePipeline::new(spawn_landmark_source(crate::gesture::LeapLandmarkSource), cfg.thresholds)
        }
    };

    // ── Window + scene (fatal before the first tick) ──────────────────────
    let vis = Visualizer::new(sim_tx, cfg.width, cfg.height).context("opening window")?;
    let scene = SceneController::new(cfg.scene.clone(), vis)?;

    let sink: Box<dyn ModeSink> = if cfg.audio { Box::new(Chime::spawn()) } else { Box::new(Silent) };
    let mut app = App::new(pipeline, scene, sink);

    // ── Photos ────────────────────────────────────────────────────────────
    let sources = photo_sources(&cfg.photos, cfg.photos_dir.as_deref());
    if !sources.is_empty() {
        log::info!("[photo] loading {} photo(s) in the background", sources.len());
        // Detached: it exits on its own once the scene is dropped.
        let _ = spawn_photo_loader(app.scene().photo_loader(), sources);
    }

    // ── Main loop ─────────────────────────────────────────────────────────
    let mut last = Instant::now();
    loop {
        let vis = app.scene_mut().host_mut();
        if !vis.is_open() { break; }

        // 1. Poll window input → SimInput / direct selection
        let input = vis.poll_input();
        if input.quit { break; }

        let (w, h) = vis.window_size();
        if (w, h) != vis.buffer_size() {
            app.scene_mut().resize(w, h);
        }
        if let Some(mode) = input.select {
            app.select_mode(mode);
        }

        // 2. Gestures → mode → tick
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;
        app.frame(dt);

        // 3. Overlay + present
        app.draw_overlay();
    }

    log::info!("[app] window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::HandPose;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use tree_scene::HeadlessHost;

    const DT: f32 = 1.0 / 60.0;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<AppMode>>>);

    impl ModeSink for Recorder {
        fn mode_changed(&mut self, mode: AppMode) {
            self.0.borrow_mut().push(mode);
        }
    }

    fn make_app(scene: SceneConfig) -> (App<HeadlessHost>, mpsc::Sender<DetectionFrame>, Recorder) {
        let (tx, rx) = mpsc::channel();
        let rec = Recorder::default();
        let pipeline = GesturePipeline::new(rx, GestureThresholds::default());
        let scene = SceneController::new(scene, HeadlessHost::new()).unwrap();
        (App::new(pipeline, scene, Box::new(rec.clone())), tx, rec)
    }

    fn small() -> SceneConfig {
        SceneConfig::default().with_counts(40, 40, 10).with_seed(7)
    }

    fn pose(ts: f64, pose: HandPose) -> DetectionFrame {
        DetectionFrame::with_hand(ts, pose.hand_at(0.5, 0.5))
    }

    fn png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(6, 4, image::Rgba([250, 200, 90, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn held_gesture_chimes_once() {
        let (mut app, tx, rec) = make_app(small());
        for i in 0..5 {
            tx.send(pose(i as f64, HandPose::OpenPalm)).unwrap();
            app.frame(DT);
        }
        assert_eq!(app.mode(), AppMode::Scatter);
        assert_eq!(*rec.0.borrow(), vec![AppMode::Scatter]);

        tx.send(pose(10.0, HandPose::Fist)).unwrap();
        let change = app.frame(DT).unwrap();
        assert_eq!((change.from, change.to), (AppMode::Scatter, AppMode::Tree));
        assert_eq!(*rec.0.borrow(), vec![AppMode::Scatter, AppMode::Tree]);
    }

    #[test]
    fn burst_that_returns_to_the_current_mode_is_silent() {
        let (mut app, tx, rec) = make_app(small());
        tx.send(pose(1.0, HandPose::Peace)).unwrap();
        tx.send(pose(2.0, HandPose::Fist)).unwrap();
        assert!(app.frame(DT).is_none());
        assert_eq!(app.mode(), AppMode::Tree);
        assert!(rec.0.borrow().is_empty());
    }

    #[test]
    fn relaxed_hand_keeps_mode_but_steers() {
        let (mut app, tx, rec) = make_app(small());
        app.select_mode(AppMode::Scatter);
        tx.send(DetectionFrame::with_hand(1.0, HandPose::Relaxed.hand_at(0.8, 0.5))).unwrap();
        app.frame(DT);
        assert_eq!(app.mode(), AppMode::Scatter);
        assert!(app.pipeline().hand().detected);
        assert!((app.pipeline().hand().x - 0.6).abs() < 1e-3);
        assert_eq!(rec.0.borrow().len(), 1);
    }

    #[test]
    fn direct_selection_only_reports_real_changes() {
        let (mut app, _tx, rec) = make_app(small());
        assert!(!app.select_mode(AppMode::Tree));
        assert!(app.select_mode(AppMode::Gallery));
        assert!(!app.select_mode(AppMode::Gallery));
        assert_eq!(*rec.0.borrow(), vec![AppMode::Gallery]);
    }

    #[test]
    fn feed_applies_detached_frames() {
        let rec = Recorder::default();
        let scene = SceneController::new(small(), HeadlessHost::new()).unwrap();
        let mut app = App::new(GesturePipeline::detached(GestureThresholds::default()), scene, Box::new(rec.clone()));
        assert!(app.feed(&pose(1.0, HandPose::Pinch)).is_some());
        assert_eq!(app.mode(), AppMode::Focus);
        assert!(app.scene().focus_target().is_some());
        // Same timestamp again is ignored.
        assert!(app.feed(&pose(1.0, HandPose::Fist)).is_none());
        assert_eq!(*rec.0.borrow(), vec![AppMode::Focus]);
    }

    #[test]
    fn focus_without_photos_still_animates() {
        let mut cfg = small();
        cfg.placeholder_photo = false;
        let (mut app, _tx, _rec) = make_app(cfg);
        app.select_mode(AppMode::Focus);
        assert!(app.scene().focus_target().is_none());
        for _ in 0..30 {
            app.frame(DT);
        }
        assert_eq!(app.scene().host().frames, 30);
    }

    #[test]
    fn ready_signal_fires_after_setup_latency() {
        let (mut app, _tx, _rec) = make_app(small());
        app.frame(0.5);
        assert!(!app.scene().is_ready());
        app.frame(0.6);
        assert!(app.scene().is_ready());
    }

    #[test]
    fn repeated_photo_sources_are_loaded_once() {
        let photos = vec![
            "a.jpg".to_string(),
            "https://example.com/b.png".to_string(),
            "a.jpg".to_string(),
            "https://example.com/b.png".to_string(),
        ];
        let sources = photo_sources(&photos, None);
        assert_eq!(sources, vec![
            ImageSource::Path(PathBuf::from("a.jpg")),
            ImageSource::Url("https://example.com/b.png".to_string()),
        ]);
    }

    #[test]
    fn photos_dir_contributes_sorted_images_only() {
        let dir = std::env::temp_dir().join(format!("gesture_tree_photos_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        let given = vec![dir.join("b.PNG").display().to_string()];
        let sources = photo_sources(&given, Some(&dir));
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(sources, vec![
            ImageSource::Path(dir.join("b.PNG")),
            ImageSource::Path(dir.join("a.jpg")),
        ]);
    }

    #[test]
    fn missing_photos_dir_is_not_fatal() {
        let sources = photo_sources(&[], Some(Path::new("/definitely/not/here")));
        assert!(sources.is_empty());
    }

    #[test]
    fn loader_thread_skips_failures() {
        let (mut app, _tx, _rec) = make_app(small());
        let sources = vec![
            ImageSource::Path(PathBuf::from("/definitely/not/here.png")),
            ImageSource::Bytes(vec![0, 1, 2]),
            ImageSource::Bytes(png()),
        ];
        let loaded = spawn_photo_loader(app.scene().photo_loader(), sources).join().unwrap();
        assert_eq!(loaded, 1);

        app.frame(DT);
        assert_eq!(app.scene().registry().count_photos(), 1);
        assert!(!app.scene().registry().has_placeholder());
    }
}
