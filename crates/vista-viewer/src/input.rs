// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyboard routing: arrow keys move the camera, Escape opens the exit prompt.
//!
//! The movement basis is derived from the camera on every call; pointer-drag
//! navigation may have re-oriented it since the last key press.

use glam::Vec3;
use vista_scene_port::CameraState;

/// World units per arrow-key press.
pub const DEFAULT_STEP: f32 = 0.2;

/// Keys the viewer understands; everything else is carried as its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Move forward.
    ArrowUp,
    /// Move backward.
    ArrowDown,
    /// Strafe left.
    ArrowLeft,
    /// Strafe right.
    ArrowRight,
    /// Open the exit prompt.
    Escape,
    /// Any other key, by its code.
    Other(String),
}

impl Key {
    /// Parse a DOM-style key code (`"ArrowUp"`, `"Escape"`, ...).
    pub fn from_code(code: &str) -> Self {
        match code {
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The key's code.
    pub fn code(&self) -> &str {
        match self {
            Self::ArrowUp => "ArrowUp",
            Self::ArrowDown => "ArrowDown",
            Self::ArrowLeft => "ArrowLeft",
            Self::ArrowRight => "ArrowRight",
            Self::Escape => "Escape",
            Self::Other(code) => code,
        }
    }
}

/// What a key press resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRoute {
    /// New camera pose.
    Move(CameraState),
    /// Show the exit confirmation.
    ExitPrompt,
    /// Not a viewer key.
    Ignored,
}

/// Forward (towards the target) and right unit vectors of `camera`.
///
/// A camera sitting on its target moves along world `-Z`; one looking along
/// its up vector strafes along world `+X`.
pub fn movement_basis(camera: &CameraState) -> (Vec3, Vec3) {
    let forward = (Vec3::from(camera.target) - Vec3::from(camera.position))
        .try_normalize()
        .unwrap_or(Vec3::NEG_Z);
    let right = forward
        .cross(Vec3::from(camera.up))
        .try_normalize()
        .unwrap_or(Vec3::X);
    (forward, right)
}

/// Route `key` against the current camera pose.
pub fn route_key(camera: &CameraState, key: &Key, step: f32) -> KeyRoute {
    let (forward, right) = movement_basis(camera);
    let delta = match key {
        Key::ArrowUp => forward * step,
        Key::ArrowDown => -forward * step,
        Key::ArrowLeft => -right * step,
        Key::ArrowRight => right * step,
        Key::Escape => return KeyRoute::ExitPrompt,
        Key::Other(_) => return KeyRoute::Ignored,
    };
    let mut next = *camera;
    next.position = (Vec3::from(camera.position) + delta).to_array();
    KeyRoute::Move(next)
}
