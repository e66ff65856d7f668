// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer error taxonomy and teardown reporting.

use std::fmt;

use thiserror::Error;
use vista_scene_port::PortError;

use crate::resources::ResourceSetId;

/// Errors surfaced by the viewer to its host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// No scene decoder could be resolved; file selection stays blocked.
    #[error("3D loaders unavailable: {0}")]
    LoadersUnavailable(String),
    /// A zero-length buffer was offered.
    #[error("asset buffer is empty")]
    EmptyAsset,
    /// The decoder rejected the asset.
    #[error("Failed to load model: {0}")]
    DecodeFailed(String),
    /// A frame failed to render; the loop has stopped.
    #[error("render failure: {0}")]
    RenderFailure(String),
    /// A port failed while a resource set was being built.
    #[error(transparent)]
    Backend(#[from] PortError),
    /// The controller has been retired.
    #[error("viewer has been disposed")]
    Disposed,
}

/// One release step of a resource-set teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Cancel the pending animation frame.
    CancelFrame,
    /// Dispose the navigation controller.
    DisposeNavigation,
    /// Dispose the renderer and its surface.
    DisposeRenderer,
    /// Detach the model node from the scene root.
    DetachModel,
    /// Remove the resize listener.
    RemoveResizeListener,
    /// Clear the mount point.
    ClearMount,
    /// Remove the controller's keydown listener (dispose only).
    RemoveKeyListener,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CancelFrame => "cancel frame",
            Self::DisposeNavigation => "dispose navigation",
            Self::DisposeRenderer => "dispose renderer",
            Self::DetachModel => "detach model",
            Self::RemoveResizeListener => "remove resize listener",
            Self::ClearMount => "clear mount",
            Self::RemoveKeyListener => "remove key listener",
        };
        f.write_str(s)
    }
}

/// A single release step that failed. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} failed: {reason}")]
pub struct DisposerError {
    /// Which step failed.
    pub step: TeardownStep,
    /// What the port reported.
    pub reason: PortError,
}

/// Outcome of a best-effort teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Resource set that was released, if one was live.
    pub released: Option<ResourceSetId>,
    /// Steps that failed; every other step still ran.
    pub errors: Vec<DisposerError>,
}

impl TeardownReport {
    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn merge(&mut self, other: Self) {
        self.released = self.released.or(other.released);
        self.errors.extend(other.errors);
    }
}
