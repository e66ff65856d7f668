// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orbit navigation: pointer drag orbits the camera around a pivot, wheel zooms.

use glam::Vec3;
use std::f32::consts::PI;
use vista_scene_port::{CameraState, NavigationController, PortError};

/// Keep the camera off the poles so `up` stays meaningful.
pub const MAX_PITCH: f32 = PI * 0.5 - 0.01;
const RADIANS_PER_PIXEL: f32 = 0.005;
const MIN_RADIUS: f32 = 0.05;
const MAX_RADIUS: f32 = 10_000.0;
const REST: f32 = 1e-5;

/// Spherical orbit controller with optional inertial damping.
///
/// The orbit is recomputed from `camera.position - target` on every update,
/// so keyboard movement between frames is preserved.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_pending: f32,
    damping: bool,
    damping_factor: f32,
    disposed: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_pending: 1.0,
            damping: false,
            damping_factor: 0.1,
            disposed: false,
        }
    }
}

impl OrbitControls {
    /// Controller orbiting the origin without damping.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `dispose` has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn at_rest(&self) -> bool {
        self.yaw_velocity.abs() < REST
            && self.pitch_velocity.abs() < REST
            && (self.zoom_pending - 1.0).abs() < REST
    }
}

impl NavigationController for OrbitControls {
    fn set_damping(&mut self, enabled: bool, factor: f32) {
        self.damping = enabled;
        self.damping_factor = factor.clamp(0.01, 1.0);
    }

    fn set_target(&mut self, target: [f32; 3]) {
        self.target = Vec3::from(target);
    }

    fn target(&self) -> [f32; 3] {
        self.target.to_array()
    }

    fn rotate(&mut self, dx: f32, dy: f32) {
        if self.disposed {
            return;
        }
        self.yaw_velocity += dx * RADIANS_PER_PIXEL;
        self.pitch_velocity += dy * RADIANS_PER_PIXEL;
    }

    fn zoom(&mut self, scale: f32) {
        if self.disposed || !scale.is_finite() || scale <= 0.0 {
            return;
        }
        self.zoom_pending *= scale;
    }

    fn update(&mut self, camera: &mut CameraState) -> bool {
        if self.disposed {
            return false;
        }
        let retarget = Vec3::from(camera.target) != self.target;
        if self.at_rest() && !retarget {
            return false;
        }

        let step = if self.damping { self.damping_factor } else { 1.0 };
        let d_yaw = self.yaw_velocity * step;
        let d_pitch = self.pitch_velocity * step;
        let zoom = self.zoom_pending.powf(step);
        self.yaw_velocity -= d_yaw;
        self.pitch_velocity -= d_pitch;
        self.zoom_pending /= zoom;
        if self.at_rest() {
            self.yaw_velocity = 0.0;
            self.pitch_velocity = 0.0;
            self.zoom_pending = 1.0;
        }

        let offset = Vec3::from(camera.position) - self.target;
        let len = offset.length();
        camera.target = self.target.to_array();
        if len < f32::EPSILON {
            return retarget;
        }
        let radius = (len * zoom).clamp(MIN_RADIUS, MAX_RADIUS);
        let yaw = offset.x.atan2(offset.z) - d_yaw;
        let pitch = ((offset.y / len).clamp(-1.0, 1.0).asin() + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        let next = self.target
            + Vec3::new(
                radius * pitch.cos() * yaw.sin(),
                radius * pitch.sin(),
                radius * pitch.cos() * yaw.cos(),
            );
        camera.position = next.to_array();
        true
    }

    fn dispose(&mut self) -> Result<(), PortError> {
        if self.disposed {
            return Err(PortError::UnknownHandle("orbit controls already disposed".into()));
        }
        self.disposed = true;
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.zoom_pending = 1.0;
        Ok(())
    }
}
