//! Depth-of-field parameters. The scene only eases them; the host decides
//! what they look like.

use hand_gesture::AppMode;

use crate::blend::approach;

const BLUR_RATE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusBlur {
    pub focus:    f32,
    pub aperture: f32,
    pub max_blur: f32,
}

impl Default for FocusBlur {
    fn default() -> Self {
        FocusBlur { focus: 40.0, aperture: 0.00002, max_blur: 0.003 }
    }
}

impl FocusBlur {
    pub fn target_for(mode: AppMode) -> FocusBlur {
        match mode {
            AppMode::Focus   => FocusBlur { focus: 35.0, aperture: 0.00001,  max_blur: 0.002 },
            AppMode::Gallery => FocusBlur { focus: 20.0, aperture: 0.000005, max_blur: 0.001 },
            _                => FocusBlur::default(),
        }
    }

    pub fn update(&mut self, mode: AppMode, dt: f32) {
        let t = Self::target_for(mode);
        self.focus    = approach(self.focus,    t.focus,    BLUR_RATE, dt);
        self.aperture = approach(self.aperture, t.aperture, BLUR_RATE, dt);
        self.max_blur = approach(self.max_blur, t.max_blur, BLUR_RATE, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_on_mode_targets() {
        let mut b = FocusBlur::default();
        for _ in 0..1200 {
            b.update(AppMode::Gallery, 1.0 / 60.0);
        }
        assert!((b.focus - 20.0).abs() < 1e-3);
        assert!((b.max_blur - 0.001).abs() < 1e-6);

        // One long frame lands on the target.
        b.update(AppMode::Tree, 1.0);
        let d = FocusBlur::default();
        assert!((b.focus - d.focus).abs() < 1e-4);
        assert!((b.aperture - d.aperture).abs() < 1e-9);
        assert!((b.max_blur - d.max_blur).abs() < 1e-7);
    }

    #[test]
    fn scatter_and_tree_share_defaults() {
        assert_eq!(FocusBlur::target_for(AppMode::Scatter), FocusBlur::target_for(AppMode::Tree));
    }
}
