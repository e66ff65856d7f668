// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signals the viewer emits to its host, and the status overlay snapshot.

use crate::controller::LifecycleState;
use crate::error::ViewerError;
use crate::resources::ResourceSetId;

/// Signal queued for the host; drain with `ViewerController::drain_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// A scene is live. The host may update its location marker but must
    /// not remount the viewer.
    SceneReady {
        /// The new resource set.
        set: ResourceSetId,
        /// Display name of the asset.
        name: String,
    },
    /// Show the exit confirmation.
    ExitPromptShown,
    /// Hide the exit confirmation.
    ExitPromptHidden,
    /// The viewer was disposed on confirm; leave the page.
    NavigateAway,
    /// Something failed; also recorded as the current error.
    Error(ViewerError),
}

/// Snapshot for the "Viewing: name / Loading... / error" overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerStatus {
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Name of the asset being shown or loaded.
    pub scene_name: Option<String>,
    /// True while a decode is in flight.
    pub loading: bool,
    /// Most recent error message, cleared by the next load.
    pub error: Option<String>,
}

impl ViewerStatus {
    /// One-line summary for a status bar.
    pub fn headline(&self) -> String {
        if let Some(err) = &self.error {
            return err.clone();
        }
        match (&self.scene_name, self.loading) {
            (Some(name), true) => format!("Loading {name}..."),
            (Some(name), false) => format!("Viewing: {name}"),
            (None, _) => match self.state {
                LifecycleState::Idle | LifecycleState::LoadersPending => {
                    "Loading 3D libraries...".to_owned()
                }
                LifecycleState::Disposed => "Viewer closed".to_owned(),
                _ => "Drop a .gltf or .glb file to view it".to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: LifecycleState, name: Option<&str>, loading: bool) -> ViewerStatus {
        ViewerStatus {
            state,
            scene_name: name.map(str::to_owned),
            loading,
            error: None,
        }
    }

    #[test]
    fn headline_prefers_errors() {
        let mut s = status(LifecycleState::Ready, Some("city.glb"), false);
        s.error = Some("Failed to load model: bad".into());
        assert_eq!(s.headline(), "Failed to load model: bad");
    }

    #[test]
    fn headline_tracks_lifecycle() {
        assert_eq!(
            status(LifecycleState::LoadersPending, None, false).headline(),
            "Loading 3D libraries..."
        );
        assert_eq!(
            status(LifecycleState::Ready, Some("park.glb"), false).headline(),
            "Viewing: park.glb"
        );
        assert_eq!(
            status(LifecycleState::Ready, Some("park.glb"), true).headline(),
            "Loading park.glb..."
        );
    }
}
