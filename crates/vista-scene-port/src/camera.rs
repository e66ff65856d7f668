// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera state types for scene rendering.

use core::f32::consts::FRAC_PI_3;

/// Perspective camera state for rendering.
///
/// Orientation is implied by `position`, `target` and `up`; the navigation
/// controller keeps `target` in sync with its orbit pivot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// Camera position in world space.
    pub position: [f32; 3],
    /// Look-at target in world space.
    pub target: [f32; 3],
    /// Up vector.
    pub up: [f32; 3],
    /// Vertical field of view in radians.
    pub fov_y_radians: f32,
    /// Width / height of the viewport.
    pub aspect: f32,
    /// Near clipping plane.
    ///
    /// Values < 0.1 may cause depth buffer precision issues.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: [2.0, 2.0, 4.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_y_radians: FRAC_PI_3, // 60 degrees
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraState {
    /// Set the aspect ratio from viewport dimensions.
    ///
    /// A zero height leaves the aspect untouched.
    pub fn set_viewport_aspect(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aspect_follows_viewport() {
        let mut cam = CameraState::default();
        cam.set_viewport_aspect(1920, 1080);
        assert_relative_eq!(cam.aspect, 16.0 / 9.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_height_keeps_previous_aspect() {
        let mut cam = CameraState::default();
        cam.set_viewport_aspect(800, 0);
        assert_relative_eq!(cam.aspect, 1.0);
    }
}
