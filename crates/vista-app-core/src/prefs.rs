// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer preferences: starting camera, navigation, movement and scene look.
//!
//! Every section is `#[serde(default)]` so older files missing a field still load.

use serde::{Deserialize, Serialize};

/// Saved preferences for the scene viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerPrefs {
    /// Starting camera pose and projection.
    pub camera: CameraPrefs,
    /// Orbit controller tuning.
    pub navigation: NavigationPrefs,
    /// Keyboard movement.
    pub movement: MovementPrefs,
    /// Background, lights and surface options.
    pub scene: ScenePrefs,
}

/// Camera position and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPrefs {
    /// World-space starting position.
    pub pos: [f32; 3],
    /// Vertical field of view (radians).
    pub fov_y: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Default for CameraPrefs {
    fn default() -> Self {
        Self {
            pos: [2.0, 2.0, 4.0],
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Orbit navigation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationPrefs {
    /// Enable inertial damping.
    pub damping: bool,
    /// Fraction of remaining motion removed per frame.
    pub damping_factor: f32,
    /// Orbit pivot.
    pub target: [f32; 3],
    /// Radians of rotation per pixel of drag, scaled.
    pub rotate_speed: f32,
}

impl Default for NavigationPrefs {
    fn default() -> Self {
        Self {
            damping: true,
            damping_factor: 0.1,
            target: [0.0, 1.0, 0.0],
            rotate_speed: 1.0,
        }
    }
}

/// Keyboard movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementPrefs {
    /// World units moved per arrow-key press.
    pub step: f32,
}

impl Default for MovementPrefs {
    fn default() -> Self {
        Self { step: 0.2 }
    }
}

/// Scene look: background, lights and renderer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenePrefs {
    /// Background / clear color (RGBA8).
    pub background: [u8; 4],
    /// Ambient light color.
    pub ambient_color: [u8; 4],
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Directional light color.
    pub directional_color: [u8; 4],
    /// Directional light intensity.
    pub directional_intensity: f32,
    /// Directional light position.
    pub directional_position: [f32; 3],
    /// Request multisampling.
    pub antialias: bool,
}

impl Default for ScenePrefs {
    fn default() -> Self {
        Self {
            background: [0x10, 0x18, 0x20, 0xff],
            ambient_color: [0xff; 4],
            ambient_intensity: 0.7,
            directional_color: [0xff; 4],
            directional_intensity: 0.8,
            directional_position: [5.0, 10.0, 7.5],
            antialias: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: ViewerPrefs =
            serde_json::from_str(r#"{"movement":{"step":0.5}}"#).expect("parse");
        assert!((prefs.movement.step - 0.5).abs() < f32::EPSILON);
        assert_eq!(prefs.camera, CameraPrefs::default());
        assert_eq!(prefs.scene.background, [0x10, 0x18, 0x20, 0xff]);
    }

    #[test]
    fn roundtrips_through_json() {
        let mut prefs = ViewerPrefs::default();
        prefs.navigation.damping = false;
        let text = serde_json::to_string(&prefs).expect("encode");
        let back: ViewerPrefs = serde_json::from_str(&text).expect("decode");
        assert_eq!(back, prefs);
    }
}
