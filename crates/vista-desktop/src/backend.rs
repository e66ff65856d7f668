// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wgpu-backed [`RenderBackend`].
//!
//! The window has exactly one wgpu surface; each renderer borrows it while
//! it is alive and refuses to draw once disposed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;
use vista_scene_port::{
    CameraState, ColorRgba8, NodeKey, PortError, RenderBackend, Renderer, RendererOptions,
    SceneGraph, SceneNode, SurfaceId,
};

use crate::gpu::Gpu;
use crate::outline::{bounding_box_lines, clear_color, view_proj};

/// Creates renderers drawing into the window's surface.
pub struct WgpuBackend {
    gpu: Rc<RefCell<Gpu>>,
    next_surface: u64,
}

impl WgpuBackend {
    pub fn new(gpu: Rc<RefCell<Gpu>>) -> Self {
        Self {
            gpu,
            next_surface: 0,
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn create_renderer(
        &mut self,
        options: &RendererOptions,
    ) -> Result<Box<dyn Renderer>, PortError> {
        self.next_surface += 1;
        let surface = SurfaceId(self.next_surface);
        let vp = options.viewport;
        self.gpu.borrow_mut().resize(vp.width, vp.height);
        debug!(surface = surface.0, antialias = options.antialias, "renderer created");
        Ok(Box::new(WgpuRenderer {
            gpu: Rc::clone(&self.gpu),
            surface,
            disposed: false,
        }))
    }

    fn create_scene(&mut self, background: ColorRgba8) -> Box<dyn SceneGraph> {
        Box::new(SceneRoot::new(background))
    }
}

struct WgpuRenderer {
    gpu: Rc<RefCell<Gpu>>,
    surface: SurfaceId,
    disposed: bool,
}

impl WgpuRenderer {
    fn ensure_live(&self) -> Result<(), PortError> {
        if self.disposed {
            return Err(PortError::UnknownHandle(format!(
                "renderer for surface {} was disposed",
                self.surface.0
            )));
        }
        Ok(())
    }
}

impl Renderer for WgpuRenderer {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn set_size(&mut self, width: u32, height: u32, _scale_factor: f32) {
        if !self.disposed {
            self.gpu.borrow_mut().resize(width, height);
        }
    }

    fn render(&mut self, scene: &dyn SceneGraph, camera: &CameraState) -> Result<(), PortError> {
        self.ensure_live()?;
        let lines = bounding_box_lines(scene);
        self.gpu
            .borrow_mut()
            .draw(clear_color(scene.background()), view_proj(camera), &lines)
    }

    fn dispose(&mut self) -> Result<(), PortError> {
        self.ensure_live()?;
        self.disposed = true;
        debug!(surface = self.surface.0, "renderer disposed");
        Ok(())
    }
}

/// In-memory scene root keyed by attachment order.
pub struct SceneRoot {
    background: ColorRgba8,
    nodes: BTreeMap<NodeKey, SceneNode>,
    next: u64,
}

impl SceneRoot {
    pub fn new(background: ColorRgba8) -> Self {
        Self {
            background,
            nodes: BTreeMap::new(),
            next: 0,
        }
    }
}

impl SceneGraph for SceneRoot {
    fn background(&self) -> ColorRgba8 {
        self.background
    }

    fn add(&mut self, node: SceneNode) -> NodeKey {
        self.next += 1;
        let key = NodeKey(self.next);
        self.nodes.insert(key, node);
        key
    }

    fn remove(&mut self, key: NodeKey) -> Result<SceneNode, PortError> {
        self.nodes
            .remove(&key)
            .ok_or_else(|| PortError::UnknownHandle(format!("node {}", key.0)))
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
