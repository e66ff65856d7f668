// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port traits defining the collaborator contracts.
//!
//! Every trait here is object safe; the viewer holds collaborators as
//! `Box<dyn …>` so one ResourceSet can never alias another's handles.

use bytes::Bytes;
use futures_util::future::LocalBoxFuture;

use crate::{
    CameraState, ColorRgba8, DecodeError, FrameHandle, ListenerHandle, ListenerKind, NodeKey,
    PortError, SceneNode, SurfaceId, Viewport,
};

/// Future returned by [`SceneDecoder::parse`].
///
/// Local (not `Send`): decode continuations resume on the host's cooperative loop.
pub type DecodeFuture = LocalBoxFuture<'static, Result<SceneNode, DecodeError>>;

/// Construction parameters for a renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererOptions {
    /// Initial surface size.
    pub viewport: Viewport,
    /// Clear color for every frame.
    pub clear_color: ColorRgba8,
    /// Request multisampling when the backend supports it.
    pub antialias: bool,
}

/// A live renderer bound to one render surface.
pub trait Renderer {
    /// Surface this renderer draws into.
    fn surface(&self) -> SurfaceId;

    /// Resize the drawable surface.
    fn set_size(&mut self, width: u32, height: u32, scale_factor: f32);

    /// Draw one frame of `scene` as seen from `camera`.
    fn render(&mut self, scene: &dyn SceneGraph, camera: &CameraState) -> Result<(), PortError>;

    /// Release GPU resources. Called exactly once by the owner.
    fn dispose(&mut self) -> Result<(), PortError>;
}

/// Root of a renderable scene graph.
pub trait SceneGraph {
    /// Background color.
    fn background(&self) -> ColorRgba8;

    /// Attach a node at the root; returns its key.
    fn add(&mut self, node: SceneNode) -> NodeKey;

    /// Detach a previously attached node.
    fn remove(&mut self, key: NodeKey) -> Result<SceneNode, PortError>;

    /// Number of root-level nodes.
    fn len(&self) -> usize;

    /// True when nothing is attached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every root-level node in attachment order.
    fn visit(&self, visitor: &mut dyn FnMut(NodeKey, &SceneNode));
}

/// Factory for renderers and scene roots.
pub trait RenderBackend {
    /// Create a renderer and its render surface.
    fn create_renderer(&mut self, options: &RendererOptions)
        -> Result<Box<dyn Renderer>, PortError>;

    /// Create an empty scene root.
    fn create_scene(&mut self, background: ColorRgba8) -> Box<dyn SceneGraph>;
}

/// Binary scene decoder.
pub trait SceneDecoder {
    /// Parse `buffer` into a scene node.
    fn parse(&self, buffer: Bytes) -> DecodeFuture;
}

/// Pointer-driven camera navigation (orbit, pan, zoom).
pub trait NavigationController {
    /// Configure inertial damping.
    fn set_damping(&mut self, enabled: bool, factor: f32);

    /// Set the orbit pivot.
    fn set_target(&mut self, target: [f32; 3]);

    /// Current orbit pivot.
    fn target(&self) -> [f32; 3];

    /// Feed a pointer drag in physical pixels.
    fn rotate(&mut self, dx: f32, dy: f32);

    /// Scale the orbit distance (< 1 zooms in).
    fn zoom(&mut self, scale: f32);

    /// Advance damping and write the resulting pose into `camera`.
    ///
    /// Returns `true` when the pose changed.
    fn update(&mut self, camera: &mut CameraState) -> bool;

    /// Release listeners and state. Called exactly once by the owner.
    fn dispose(&mut self) -> Result<(), PortError>;
}

/// Host window services: frame scheduling, listeners and the mount point.
pub trait HostPort {
    /// Request a callback on the next animation frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending frame request.
    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<(), PortError>;

    /// Current viewport dimensions.
    fn viewport(&self) -> Viewport;

    /// Register a window-level listener.
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle;

    /// Unregister a listener.
    fn remove_listener(&mut self, handle: ListenerHandle) -> Result<(), PortError>;

    /// Insert a render surface into the mount point.
    fn mount_surface(&mut self, surface: SurfaceId) -> Result<(), PortError>;

    /// Remove everything from the mount point.
    fn clear_mount(&mut self) -> Result<(), PortError>;
}
