// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless adapters for exercising the viewer lifecycle without a GPU.
//!
//! Every adapter records what it allocated and released in shared state, so
//! a test (or the `vista simulate` command) can keep a clone and inspect the
//! ledger after the viewer has taken ownership of the boxed adapter.

use std::cell::{Cell, Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use bytes::Bytes;
use futures_util::{future, FutureExt};
use vista_scene_port::{
    CameraState, ColorRgba8, DecodeError, DecodeFuture, FrameHandle, HostPort, ListenerHandle,
    ListenerKind, NodeKey, PortError, RenderBackend, Renderer, RendererOptions, SceneDecoder,
    SceneGraph, SceneNode, SurfaceId, Viewport,
};

/// Allocation ledger shared by a [`HeadlessBackend`] and its renderers.
#[derive(Debug, Default)]
pub struct HeadlessLedger {
    /// Renderers ever created.
    pub renderers_created: u32,
    /// Renderers disposed (first disposal only).
    pub renderers_disposed: u32,
    /// Dispose calls on an already disposed renderer.
    pub double_disposals: u32,
    /// Surfaces created and not yet disposed.
    pub live_surfaces: BTreeSet<SurfaceId>,
    /// Scene roots created.
    pub scenes_created: u32,
    /// Total successful render calls.
    pub render_count: u64,
    /// Camera passed to the most recent render.
    pub last_camera: Option<CameraState>,
    /// Root-level node count seen by the most recent render.
    pub last_scene_len: usize,
    /// Most recent `set_size` call.
    pub last_size: Option<(u32, u32, f32)>,
    /// Fail every render once a renderer has drawn this many frames.
    pub fail_render_after: Option<u64>,
    /// Make every renderer `dispose` report an error (after releasing).
    pub fail_dispose: bool,
    /// Make `create_renderer` fail.
    pub fail_create: bool,
}

/// Render backend that allocates numbered surfaces and draws nothing.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    ledger: Rc<RefCell<HeadlessLedger>>,
    next_surface: Rc<Cell<u64>>,
}

impl HeadlessBackend {
    /// Create a backend with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the shared ledger.
    pub fn ledger(&self) -> Ref<'_, HeadlessLedger> {
        self.ledger.borrow()
    }

    /// Inject a render failure after `frames` successful frames per renderer.
    pub fn fail_render_after(&self, frames: u64) {
        self.ledger.borrow_mut().fail_render_after = Some(frames);
    }

    /// Make renderer disposal report errors.
    pub fn fail_dispose(&self, fail: bool) {
        self.ledger.borrow_mut().fail_dispose = fail;
    }

    /// Make renderer creation fail.
    pub fn fail_create(&self, fail: bool) {
        self.ledger.borrow_mut().fail_create = fail;
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_renderer(
        &mut self,
        options: &RendererOptions,
    ) -> Result<Box<dyn Renderer>, PortError> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.fail_create {
            return Err(PortError::Allocation("headless renderer creation disabled".into()));
        }
        let id = self.next_surface.get() + 1;
        self.next_surface.set(id);
        let surface = SurfaceId(id);
        ledger.renderers_created += 1;
        ledger.live_surfaces.insert(surface);
        let vp = options.viewport;
        ledger.last_size = Some((vp.width, vp.height, vp.scale_factor));
        Ok(Box::new(HeadlessRenderer {
            surface,
            ledger: Rc::clone(&self.ledger),
            frames: 0,
            disposed: false,
        }))
    }

    fn create_scene(&mut self, background: ColorRgba8) -> Box<dyn SceneGraph> {
        self.ledger.borrow_mut().scenes_created += 1;
        Box::new(HeadlessScene::new(background))
    }
}

/// Renderer that counts frames into the shared ledger.
#[derive(Debug)]
pub struct HeadlessRenderer {
    surface: SurfaceId,
    ledger: Rc<RefCell<HeadlessLedger>>,
    frames: u64,
    disposed: bool,
}

impl Renderer for HeadlessRenderer {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn set_size(&mut self, width: u32, height: u32, scale_factor: f32) {
        self.ledger.borrow_mut().last_size = Some((width, height, scale_factor));
    }

    fn render(&mut self, scene: &dyn SceneGraph, camera: &CameraState) -> Result<(), PortError> {
        if self.disposed {
            return Err(PortError::UnknownHandle(format!(
                "surface {} already disposed",
                self.surface.0
            )));
        }
        let mut ledger = self.ledger.borrow_mut();
        if ledger.fail_render_after.is_some_and(|n| self.frames >= n) {
            return Err(PortError::Backend("injected render failure".into()));
        }
        self.frames += 1;
        ledger.render_count += 1;
        ledger.last_camera = Some(*camera);
        ledger.last_scene_len = scene.len();
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), PortError> {
        let mut ledger = self.ledger.borrow_mut();
        if self.disposed {
            ledger.double_disposals += 1;
            return Err(PortError::UnknownHandle(format!(
                "surface {} disposed twice",
                self.surface.0
            )));
        }
        self.disposed = true;
        ledger.renderers_disposed += 1;
        ledger.live_surfaces.remove(&self.surface);
        if ledger.fail_dispose {
            return Err(PortError::Backend("injected dispose failure".into()));
        }
        Ok(())
    }
}

/// Scene root keeping attached nodes in a vector.
#[derive(Debug)]
pub struct HeadlessScene {
    background: ColorRgba8,
    nodes: Vec<(NodeKey, SceneNode)>,
    next_key: u64,
}

impl HeadlessScene {
    /// Create an empty scene.
    pub fn new(background: ColorRgba8) -> Self {
        Self {
            background,
            nodes: Vec::new(),
            next_key: 0,
        }
    }
}

impl SceneGraph for HeadlessScene {
    fn background(&self) -> ColorRgba8 {
        self.background
    }

    fn add(&mut self, node: SceneNode) -> NodeKey {
        self.next_key += 1;
        let key = NodeKey(self.next_key);
        self.nodes.push((key, node));
        key
    }

    fn remove(&mut self, key: NodeKey) -> Result<SceneNode, PortError> {
        let idx = self
            .nodes
            .iter()
            .position(|(k, _)| *k == key)
            .ok_or_else(|| PortError::UnknownHandle(format!("node {}", key.0)))?;
        Ok(self.nodes.remove(idx).1)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn visit(&self, visitor: &mut dyn FnMut(NodeKey, &SceneNode)) {
        for (key, node) in &self.nodes {
            visitor(*key, node);
        }
    }
}

/// Observable state of a [`HeadlessHost`].
#[derive(Debug, Default)]
pub struct HostState {
    next_handle: u64,
    /// Frame requests not yet delivered or cancelled.
    pub pending_frames: BTreeSet<FrameHandle>,
    /// Successful `cancel_frame` calls.
    pub cancelled_frames: u32,
    /// Registered listeners.
    pub listeners: BTreeMap<ListenerHandle, ListenerKind>,
    /// Surfaces currently inserted into the mount point, in insertion order.
    pub mounted: Vec<SurfaceId>,
    /// Current viewport.
    pub viewport: Viewport,
    /// Make `clear_mount` report an error (after clearing).
    pub fail_clear_mount: bool,
}

impl HostState {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Host that queues frame requests until the caller pumps them.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    state: Rc<RefCell<HostState>>,
}

impl HeadlessHost {
    /// Create a host with the given viewport.
    pub fn new(viewport: Viewport) -> Self {
        let host = Self::default();
        host.state.borrow_mut().viewport = viewport;
        host
    }

    /// Borrow the observable state.
    pub fn state(&self) -> Ref<'_, HostState> {
        self.state.borrow()
    }

    /// Change the viewport (the caller then notifies the viewer).
    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    /// Drain all pending frame requests, oldest first.
    pub fn take_due_frames(&self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.state.borrow_mut().pending_frames)
            .into_iter()
            .collect()
    }

    /// Number of registered listeners of `kind`.
    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.state
            .borrow()
            .listeners
            .values()
            .filter(|k| **k == kind)
            .count()
    }

    /// Surfaces currently in the mount point.
    pub fn mounted(&self) -> Vec<SurfaceId> {
        self.state.borrow().mounted.clone()
    }

    /// Make `clear_mount` report errors.
    pub fn fail_clear_mount(&self, fail: bool) {
        self.state.borrow_mut().fail_clear_mount = fail;
    }
}

impl HostPort for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        let handle = FrameHandle(state.next());
        state.pending_frames.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<(), PortError> {
        let mut state = self.state.borrow_mut();
        if !state.pending_frames.remove(&handle) {
            return Err(PortError::UnknownHandle(format!("frame {}", handle.0)));
        }
        state.cancelled_frames += 1;
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle {
        let mut state = self.state.borrow_mut();
        let handle = ListenerHandle(state.next());
        state.listeners.insert(handle, kind);
        handle
    }

    fn remove_listener(&mut self, handle: ListenerHandle) -> Result<(), PortError> {
        self.state
            .borrow_mut()
            .listeners
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| PortError::UnknownHandle(format!("listener {}", handle.0)))
    }

    fn mount_surface(&mut self, surface: SurfaceId) -> Result<(), PortError> {
        self.state.borrow_mut().mounted.push(surface);
        Ok(())
    }

    fn clear_mount(&mut self) -> Result<(), PortError> {
        let mut state = self.state.borrow_mut();
        state.mounted.clear();
        if state.fail_clear_mount {
            return Err(PortError::Backend("injected mount failure".into()));
        }
        Ok(())
    }
}

/// Decoder returning a preset result without touching the buffer.
#[derive(Debug, Clone)]
pub struct ScriptedDecoder {
    result: Result<SceneNode, DecodeError>,
    calls: Rc<Cell<u32>>,
}

impl ScriptedDecoder {
    /// Decoder that always yields `node`.
    pub fn ok(node: SceneNode) -> Self {
        Self {
            result: Ok(node),
            calls: Rc::default(),
        }
    }

    /// Decoder that always fails with `err`.
    pub fn err(err: DecodeError) -> Self {
        Self {
            result: Err(err),
            calls: Rc::default(),
        }
    }

    /// Number of `parse` calls so far (shared across clones).
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl SceneDecoder for ScriptedDecoder {
    fn parse(&self, _buffer: Bytes) -> DecodeFuture {
        self.calls.set(self.calls.get() + 1);
        future::ready(self.result.clone()).boxed_local()
    }
}
