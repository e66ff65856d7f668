// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The exclusive bundle of live handles behind one loaded scene.
//!
//! A [`ResourceSet`] is built from freshly allocated handles only and is
//! released by value, so a handle can never be shared between two sets and a
//! set can never be released twice.

use std::fmt;

use tracing::{debug, info, warn};
use vista_app_core::prefs::ViewerPrefs;
use vista_scene_port::{
    CameraState, FrameHandle, HostPort, ListenerHandle, ListenerKind, NavigationController,
    NodeKey, NodeKind, PortError, RenderBackend, Renderer, RendererOptions, SceneGraph, SceneNode,
    SurfaceId, Viewport,
};

use crate::error::{DisposerError, TeardownReport, TeardownStep, ViewerError};
use crate::perf::PerfStats;
use crate::provisioner::LoaderRegistry;
use crate::render_loop::{FrameOutcome, LoopState, RenderLoop};

/// Identity of one resource set within a controller.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceSetId(pub u64);

impl fmt::Display for ResourceSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything `ResourceSet::build` borrows from its controller.
pub(crate) struct BuildContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub host: &'a mut dyn HostPort,
    pub registry: &'a LoaderRegistry,
    pub prefs: &'a ViewerPrefs,
}

/// Live handles for one loaded scene.
pub struct ResourceSet {
    id: ResourceSetId,
    name: String,
    renderer: Box<dyn Renderer>,
    scene: Box<dyn SceneGraph>,
    camera: CameraState,
    navigation: Option<Box<dyn NavigationController>>,
    model: Option<NodeKey>,
    resize_listener: Option<ListenerHandle>,
    render_loop: RenderLoop,
}

impl ResourceSet {
    /// Allocate a renderer and scene, mount the surface, attach `model`,
    /// listen for resizes and start the render loop.
    ///
    /// If a step fails, whatever was already allocated is released before the
    /// error is returned.
    pub(crate) fn build(
        id: ResourceSetId,
        name: &str,
        model: SceneNode,
        ctx: BuildContext<'_>,
    ) -> Result<Self, ViewerError> {
        let BuildContext {
            backend,
            host,
            registry,
            prefs,
        } = ctx;
        let viewport = host.viewport();
        let scene_prefs = &prefs.scene;

        let renderer = backend.create_renderer(&RendererOptions {
            viewport,
            clear_color: scene_prefs.background,
            antialias: scene_prefs.antialias,
        })?;

        let mut scene = backend.create_scene(scene_prefs.background);
        scene.add(SceneNode::leaf(NodeKind::AmbientLight {
            color: scene_prefs.ambient_color,
            intensity: scene_prefs.ambient_intensity,
        }));
        scene.add(SceneNode::leaf(NodeKind::DirectionalLight {
            color: scene_prefs.directional_color,
            intensity: scene_prefs.directional_intensity,
            position: scene_prefs.directional_position,
        }));

        let mut camera = CameraState {
            position: prefs.camera.pos,
            target: prefs.navigation.target,
            fov_y_radians: prefs.camera.fov_y,
            near: prefs.camera.near,
            far: prefs.camera.far,
            ..CameraState::default()
        };
        camera.set_viewport_aspect(viewport.width, viewport.height);

        let navigation = registry.navigation.get().map(|factory| {
            let mut nav = factory();
            nav.set_damping(prefs.navigation.damping, prefs.navigation.damping_factor);
            nav.set_target(prefs.navigation.target);
            nav
        });

        let mut set = Self {
            id,
            name: name.to_owned(),
            renderer,
            scene,
            camera,
            navigation,
            model: None,
            resize_listener: None,
            render_loop: RenderLoop::idle(),
        };

        if let Err(err) = host.mount_surface(set.renderer.surface()) {
            let report = set.release(host);
            warn!(set = %id, error = %err, cleanup_errors = report.errors.len(), "mounting surface failed");
            return Err(ViewerError::Backend(err));
        }
        set.model = Some(set.scene.add(model));
        set.resize_listener = Some(host.add_listener(ListenerKind::Resize));
        set.render_loop.start(host);

        info!(set = %id, asset = name, surface = set.surface().0, "resource set built");
        Ok(set)
    }

    /// Release every handle, in order: pending frame, navigation, renderer,
    /// model node, resize listener, mount point.
    ///
    /// Every step runs even when an earlier one fails.
    pub fn release(mut self, host: &mut dyn HostPort) -> TeardownReport {
        let mut report = TeardownReport {
            released: Some(self.id),
            errors: Vec::new(),
        };
        let mut record = |step: TeardownStep, result: Result<(), PortError>| {
            if let Err(reason) = result {
                warn!(set = %self.id, %step, error = %reason, "disposer failed; continuing teardown");
                report.errors.push(DisposerError { step, reason });
            }
        };

        record(TeardownStep::CancelFrame, self.render_loop.cancel(host));
        if let Some(mut nav) = self.navigation.take() {
            record(TeardownStep::DisposeNavigation, nav.dispose());
        }
        record(TeardownStep::DisposeRenderer, self.renderer.dispose());
        if let Some(key) = self.model.take() {
            record(TeardownStep::DetachModel, self.scene.remove(key).map(drop));
        }
        if let Some(listener) = self.resize_listener.take() {
            record(TeardownStep::RemoveResizeListener, host.remove_listener(listener));
        }
        record(TeardownStep::ClearMount, host.clear_mount());

        debug!(set = %self.id, errors = report.errors.len(), "resource set released");
        report
    }

    /// Deliver a host frame to this set's render loop.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        timestamp_ms: f64,
        host: &mut dyn HostPort,
    ) -> FrameOutcome {
        let Self {
            render_loop,
            renderer,
            scene,
            camera,
            navigation,
            ..
        } = self;
        render_loop.frame(handle, timestamp_ms, host, || {
            renderer.render(&**scene, camera)?;
            if let Some(nav) = navigation.as_mut() {
                nav.update(camera);
            }
            Ok(())
        })
    }

    /// Match the camera aspect and renderer size to `viewport`.
    pub fn resize(&mut self, viewport: Viewport) {
        self.camera
            .set_viewport_aspect(viewport.width, viewport.height);
        self.renderer
            .set_size(viewport.width, viewport.height, viewport.scale_factor);
    }

    /// Feed a pointer drag to the navigation controller.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if let Some(nav) = self.navigation.as_mut() {
            nav.rotate(dx, dy);
        }
    }

    /// Feed a zoom step to the navigation controller.
    pub fn zoom(&mut self, scale: f32) {
        if let Some(nav) = self.navigation.as_mut() {
            nav.zoom(scale);
        }
    }

    /// Set identity.
    pub fn id(&self) -> ResourceSetId {
        self.id
    }

    /// Display name of the loaded asset.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current camera.
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub(crate) fn set_camera(&mut self, camera: CameraState) {
        self.camera = camera;
    }

    /// Render surface owned by this set.
    pub fn surface(&self) -> SurfaceId {
        self.renderer.surface()
    }

    /// Key of the attached model node.
    pub fn model(&self) -> Option<NodeKey> {
        self.model
    }

    /// Root-level nodes in the scene (lights plus model).
    pub fn scene_len(&self) -> usize {
        self.scene.len()
    }

    /// The scene root, for hosts that draw overlays from it.
    pub fn scene(&self) -> &dyn SceneGraph {
        self.scene.as_ref()
    }

    /// Resize listener registered for this set.
    pub fn resize_listener(&self) -> Option<ListenerHandle> {
        self.resize_listener
    }

    /// True when a navigation controller is attached.
    pub fn has_navigation(&self) -> bool {
        self.navigation.is_some()
    }

    /// Outstanding frame request.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.render_loop.pending()
    }

    /// Render loop state.
    pub fn loop_state(&self) -> LoopState {
        self.render_loop.state()
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.render_loop.frames()
    }

    /// Frame timing.
    pub fn perf(&self) -> &PerfStats {
        self.render_loop.perf()
    }
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSet")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("surface", &self.renderer.surface())
            .field("model", &self.model)
            .field("resize_listener", &self.resize_listener)
            .field("render_loop", &self.render_loop.state())
            .finish_non_exhaustive()
    }
}
