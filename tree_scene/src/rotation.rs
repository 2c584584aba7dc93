//! Global rotation of the particle group.
//!
//! In `Scatter` the hand steers: its position sets target yaw/pitch and a
//! fast horizontal swipe adds spin that keeps coasting after the hand leaves.

use std::f32::consts::PI;

use glam::{EulerRot, Quat};

use hand_gesture::{AppMode, HandState};

use crate::blend::approach;

const STEER_RATE:      f32 = 3.0;
const PITCH_DAMP_RATE: f32 = 2.0;
const SWIPE_THRESHOLD: f32 = 2.0;
const SWIPE_GAIN:      f32 = 0.15;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    /// Pitch (rad).
    pub angle_x:  f32,
    /// Yaw (rad).
    pub angle_y:  f32,
    /// Coasting yaw velocity (rad/s).
    pub velocity: f32,
}

impl RotationState {
    pub fn update(&mut self, mode: AppMode, hand: &HandState, dt: f32) {
        match mode {
            AppMode::Scatter if hand.detected => {
                self.angle_y = approach(self.angle_y, hand.x * PI * 0.9,  STEER_RATE, dt);
                self.angle_x = approach(self.angle_x, hand.y * PI * 0.25, STEER_RATE, dt);
                if hand.velocity_x.abs() > SWIPE_THRESHOLD {
                    self.velocity += hand.velocity_x * SWIPE_GAIN * dt;
                }
            }
            AppMode::Scatter => {
                self.angle_y  += self.velocity * dt;
                self.velocity *= 0.95;
            }
            AppMode::Tree | AppMode::Gallery => {
                let yaw_rate = if mode == AppMode::Tree { 0.3 } else { 0.5 };
                self.angle_y += yaw_rate * dt;
                self.angle_x  = approach(self.angle_x, 0.0, PITCH_DAMP_RATE, dt);
                self.velocity = 0.0;
            }
            AppMode::Focus => {
                self.angle_y  += 0.1 * dt;
                self.velocity *= 0.9;
            }
        }
    }

    /// Group orientation: pitch applied before yaw.
    pub fn group_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.angle_x, self.angle_y, 0.0)
    }
}
