//! First-order exponential approach used by every animated value.
//!
//! `value += (target - value) * rate * dt`, with the step factor clamped to
//! [0, 1] so a long frame lands on the target instead of overshooting it.

use glam::Vec3;

#[inline]
pub fn step_factor(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}

#[inline]
pub fn approach(value: f32, target: f32, rate: f32, dt: f32) -> f32 {
    value + (target - value) * step_factor(rate, dt)
}

#[inline]
pub fn approach_vec3(value: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    value.lerp(target, step_factor(rate, dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_frame_lands_on_target() {
        assert_eq!(approach(0.0, 10.0, 2.0, 5.0), 10.0);
    }

    #[test]
    fn converges_monotonically() {
        let mut v = Vec3::new(10.0, -4.0, 3.0);
        let target = Vec3::new(1.0, 2.0, -3.0);
        let mut last = v.distance(target);
        for _ in 0..600 {
            v = approach_vec3(v, target, 2.0, 1.0 / 60.0);
            let d = v.distance(target);
            assert!(d <= last);
            last = d;
        }
        assert!(last < 1e-3);
    }

    #[test]
    fn zero_dt_is_identity() {
        assert_eq!(approach(3.0, 7.0, 4.0, 0.0), 3.0);
    }
}
