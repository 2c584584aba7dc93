//! The rendering seam.
//!
//! The controller never draws: it hands the host a description of each
//! visual once, then a per-frame list of world transforms. A windowed host
//! rasterizes them; [`HeadlessHost`] just records what it was asked to do.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::error::SceneError;
use crate::focus_blur::FocusBlur;
use crate::particle::VisualHandle;
use crate::photo::PhotoTexture;

/// Which transform parent a visual belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    /// Rotates with the tree.
    Group,
    /// Fixed in world space (snowflakes).
    World,
}

#[derive(Clone, Debug)]
pub enum VisualKind {
    GreenBox,
    GoldBox,
    GoldSphere,
    RedSphere,
    CandyCane,
    Dust,
    Snowflake,
    Star,
    Photo(Arc<PhotoTexture>),
}

impl VisualKind {
    pub fn is_photo(&self) -> bool { matches!(self, VisualKind::Photo(_)) }
}

#[derive(Clone, Debug)]
pub struct VisualDesc {
    pub kind:  VisualKind,
    pub layer: Layer,
}

/// One visual's world transform for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderItem {
    pub handle:   VisualHandle,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale:    f32,
}

/// Everything a host needs to draw one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub camera:         Vec3,
    pub group_rotation: Quat,
    pub blur:           FocusBlur,
    pub items:          &'a [RenderItem],
    /// Seconds of scene time.
    pub elapsed:        f32,
    pub assets_ready:   bool,
}

pub trait SceneHost {
    /// Fail here if there is no surface to draw on.
    fn ensure_available(&self) -> Result<(), SceneError> { Ok(()) }

    fn add_object(&mut self, desc: &VisualDesc) -> VisualHandle;

    /// Unknown or already-removed handles are ignored.
    fn remove_object(&mut self, handle: VisualHandle);

    fn render_frame(&mut self, frame: &FrameView<'_>);

    fn resize(&mut self, width: usize, height: usize);
}

// ════════════════════════════════════════════════════════════════════════════
// HeadlessHost
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct HeadlessHost {
    next_handle:    u64,
    live:           BTreeSet<VisualHandle>,
    photos:         BTreeSet<VisualHandle>,
    pub removed:    Vec<VisualHandle>,
    pub frames:     usize,
    pub size:       (usize, usize),
    pub last_items: Vec<RenderItem>,
    pub last_blur:  Option<FocusBlur>,
    pub last_group_rotation: Quat,
    available:      bool,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        HeadlessHost {
            next_handle:  1,
            live:         BTreeSet::new(),
            photos:       BTreeSet::new(),
            removed:      Vec::new(),
            frames:       0,
            size:         (800, 600),
            last_items:   Vec::new(),
            last_blur:    None,
            last_group_rotation: Quat::IDENTITY,
            available:    true,
        }
    }
}

impl HeadlessHost {
    pub fn new() -> Self { Self::default() }

    /// A host that refuses to start, for exercising the fatal init path.
    pub fn unavailable() -> Self {
        HeadlessHost { available: false, ..Self::default() }
    }

    pub fn live_count(&self) -> usize { self.live.len() }

    pub fn live_photo_count(&self) -> usize { self.photos.len() }

    pub fn is_live(&self, handle: VisualHandle) -> bool { self.live.contains(&handle) }

    pub fn item(&self, handle: VisualHandle) -> Option<&RenderItem> {
        self.last_items.iter().find(|i| i.handle == handle)
    }
}

impl SceneHost for HeadlessHost {
    fn ensure_available(&self) -> Result<(), SceneError> {
        if self.available {
            Ok(())
        } else {
            Err(SceneError::HostInit("headless host marked unavailable".into()))
        }
    }

    fn add_object(&mut self, desc: &VisualDesc) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        if desc.kind.is_photo() {
            self.photos.insert(handle);
        }
        handle
    }

    fn remove_object(&mut self, handle: VisualHandle) {
        if self.live.remove(&handle) {
            self.photos.remove(&handle);
            self.removed.push(handle);
        }
    }

    fn render_frame(&mut self, frame: &FrameView<'_>) {
        self.frames += 1;
        self.last_items.clear();
        self.last_items.extend_from_slice(frame.items);
        self.last_blur = Some(frame.blur);
        self.last_group_rotation = frame.group_rotation;
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.size = (width, height);
    }
}
