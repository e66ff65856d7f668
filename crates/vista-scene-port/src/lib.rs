// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collaborator port contract for the Vista scene viewer.
//!
//! The viewer core owns lifecycle; everything it consumes (renderer, scene
//! graph, asset decoder, navigation controller, host window) is reached through
//! the traits in this crate. Concrete adapters live elsewhere:
//! `vista-scene-codec` (decoder + headless adapters) and `vista-desktop`
//! (winit/wgpu).
//!
//! # Design Principles
//!
//! - **Adapters are dumb**: they allocate, render and release on request.
//! - **No time ownership**: frames are requested from and delivered by the host.
//! - **Release is explicit**: every handle-owning adapter exposes `dispose`.

use thiserror::Error;

/// Error type for port operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// The backend could not allocate a resource.
    #[error("allocation failed: {0}")]
    Allocation(String),
    /// A handle was used after release or never belonged to this adapter.
    #[error("unknown handle: {0}")]
    UnknownHandle(String),
    /// A backend-specific error occurred.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Error type for asset decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer is not a recognizable scene container.
    #[error("malformed asset: {0}")]
    Malformed(String),
    /// The container parsed but holds nothing the viewer can show.
    #[error("unsupported asset: {0}")]
    Unsupported(String),
    /// The decode task was cancelled or panicked.
    #[error("decoder task failed: {0}")]
    Task(String),
}

mod camera;
mod port;
mod types;

pub use camera::CameraState;
pub use port::{
    DecodeFuture, HostPort, NavigationController, RenderBackend, Renderer, RendererOptions,
    SceneDecoder, SceneGraph,
};
pub use types::{
    Aabb, ColorRgba8, FrameHandle, ListenerHandle, ListenerKind, MeshSummary, NodeKey, NodeKind,
    SceneNode, SurfaceId, Viewport, IDENTITY,
};
