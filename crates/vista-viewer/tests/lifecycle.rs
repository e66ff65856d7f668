// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lifecycle properties of the viewer against headless adapters.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic, missing_docs)]

use approx::assert_relative_eq;
use bytes::Bytes;
use glam::Vec3;
use vista_app_core::prefs::ViewerPrefs;
use vista_scene_codec::fixtures::triangle_glb;
use vista_scene_codec::{HeadlessBackend, HeadlessHost};
use vista_scene_port::{ListenerKind, Viewport};
use vista_viewer::{
    BuiltinModules, FrameOutcome, Key, KeyRoute, LifecycleState, LoadOutcome, LoaderProvisioner,
    LoopState, PreRegistered, TeardownReport, ViewerController, ViewerError, ViewerEvent, ViewerHandle,
};

struct Rig {
    viewer: ViewerHandle,
    backend: HeadlessBackend,
    host: HeadlessHost,
}

impl Rig {
    fn with_provisioner(provisioner: LoaderProvisioner) -> Self {
        let backend = HeadlessBackend::new();
        let host = HeadlessHost::new(Viewport::default());
        let controller = ViewerController::new(
            Box::new(backend.clone()),
            Box::new(host.clone()),
            ViewerPrefs::default(),
        );
        Self {
            viewer: ViewerHandle::new(controller, provisioner),
            backend,
            host,
        }
    }

    fn new() -> Self {
        Self::with_provisioner(LoaderProvisioner::new(vec![Box::new(BuiltinModules::new())]))
    }

    async fn load(&self, scene: &str, name: &str) -> Result<LoadOutcome, ViewerError> {
        self.viewer
            .load_asset(Bytes::from(triangle_glb(scene)), name)
            .await
    }

    /// Deliver every due frame, `rounds` times.
    fn pump(&self, rounds: usize) -> Vec<FrameOutcome> {
        let mut out = Vec::new();
        for round in 0..rounds {
            for frame in self.host.take_due_frames() {
                let ts = round as f64 * 16.0;
                out.push(self.viewer.borrow_mut().on_animation_frame(frame, ts));
            }
        }
        out
    }

    fn mounted(&self) -> usize {
        self.host.mounted().len()
    }
}

#[tokio::test]
async fn loading_a_glb_activates_one_surface() {
    let rig = Rig::new();
    let outcome = rig.load("city", "city.glb").await.expect("load");
    let LoadOutcome::Active(set) = outcome else {
        panic!("expected an active set, got {outcome:?}");
    };

    let viewer = rig.viewer.borrow();
    assert_eq!(viewer.state(), &LifecycleState::Active { set });
    assert_eq!(rig.mounted(), 1);
    assert_eq!(rig.host.listener_count(ListenerKind::Resize), 1);
    assert_eq!(rig.host.listener_count(ListenerKind::KeyDown), 1);
    assert_eq!(viewer.status().headline(), "Viewing: city.glb");
    drop(viewer);

    let events = rig.viewer.borrow_mut().drain_events();
    assert_eq!(
        events,
        [ViewerEvent::SceneReady {
            set,
            name: "city.glb".into()
        }]
    );
}

#[tokio::test]
async fn second_load_tears_down_before_attaching() {
    let rig = Rig::new();
    rig.load("city", "city.glb").await.expect("first load");
    let first_surface = rig.host.mounted()[0];

    rig.viewer.ensure_loaders().await;
    let pending = rig
        .viewer
        .borrow_mut()
        .begin_load(Bytes::from(triangle_glb("park")), "park.glb")
        .expect("begin");
    // Old set fully released before the decode even starts.
    assert_eq!(rig.mounted(), 0);
    assert_eq!(rig.host.state().cancelled_frames, 1);
    assert_eq!(rig.host.listener_count(ListenerKind::Resize), 0);
    assert_eq!(rig.backend.ledger().renderers_disposed, 1);

    let decoded = pending.decode().await;
    rig.viewer
        .borrow_mut()
        .finish_load(decoded)
        .expect("finish");
    let mounted = rig.host.mounted();
    assert_eq!(mounted.len(), 1);
    assert_ne!(mounted[0], first_surface);
    assert_eq!(rig.backend.ledger().live_surfaces.len(), 1);
}

#[tokio::test]
async fn repeated_loads_never_overlap() {
    let rig = Rig::new();
    for i in 0..6 {
        rig.load("scene", &format!("scene-{i}.glb"))
            .await
            .expect("load");
        rig.pump(2);
        assert_eq!(rig.mounted(), 1);
        assert_eq!(rig.backend.ledger().live_surfaces.len(), 1);
        assert_eq!(rig.host.listener_count(ListenerKind::Resize), 1);
        assert_eq!(rig.host.state().pending_frames.len(), 1);
    }
    let ledger = rig.backend.ledger();
    assert_eq!(ledger.renderers_created, 6);
    assert_eq!(ledger.renderers_disposed, 5);
    assert_eq!(ledger.double_disposals, 0);
}

#[tokio::test]
async fn teardown_twice_is_harmless() {
    let rig = Rig::new();
    rig.load("city", "city.glb").await.expect("load");

    let first = rig.viewer.borrow_mut().teardown();
    let second = rig.viewer.borrow_mut().teardown();
    assert!(first.released.is_some());
    assert!(first.is_clean());
    assert_eq!(second, TeardownReport::default());

    assert_eq!(rig.backend.ledger().double_disposals, 0);
    assert_eq!(rig.backend.ledger().renderers_disposed, 1);
    assert_eq!(rig.mounted(), 0);
    assert_eq!(rig.viewer.borrow().state(), &LifecycleState::Ready);
}

#[tokio::test]
async fn dispose_removes_the_key_listener() {
    let rig = Rig::new();
    rig.load("city", "city.glb").await.expect("load");
    let before = rig.backend.ledger().last_camera;

    let report = rig.viewer.borrow_mut().dispose();
    assert!(report.is_clean());
    assert_eq!(rig.host.listener_count(ListenerKind::KeyDown), 0);
    assert!(rig.host.state().listeners.is_empty());

    let route = rig.viewer.borrow_mut().handle_key(&Key::ArrowUp);
    assert_eq!(route, KeyRoute::Ignored);
    assert_eq!(rig.viewer.borrow().camera(), None);
    assert!(rig.pump(3).is_empty());
    assert_eq!(rig.backend.ledger().last_camera, before);

    // Second dispose is a no-op.
    assert_eq!(rig.viewer.borrow_mut().dispose(), TeardownReport::default());
    assert_eq!(rig.viewer.borrow().state(), &LifecycleState::Disposed);
}

#[tokio::test]
async fn failed_decode_returns_to_ready_and_recovers() {
    let rig = Rig::new();
    let err = rig
        .viewer
        .load_asset(Bytes::from_static(b"definitely not gltf"), "broken.glb")
        .await
        .unwrap_err();
    assert!(matches!(err, ViewerError::DecodeFailed(_)));
    {
        let viewer = rig.viewer.borrow();
        assert_eq!(viewer.state(), &LifecycleState::Ready);
        assert!(viewer.resources().is_none());
        let status = viewer.status();
        assert!(status
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Failed to load model:")));
    }
    assert_eq!(rig.mounted(), 0);

    rig.load("city", "city.glb").await.expect("recovery load");
    let viewer = rig.viewer.borrow();
    assert!(matches!(viewer.state(), LifecycleState::Active { .. }));
    assert!(viewer.last_error().is_none());
}

#[tokio::test]
async fn arrow_up_moves_along_forward_only_when_active() {
    let rig = Rig::new();
    rig.viewer.ensure_loaders().await;
    assert_eq!(
        rig.viewer.borrow_mut().handle_key(&Key::ArrowUp),
        KeyRoute::Ignored
    );
    assert_eq!(rig.viewer.borrow().state(), &LifecycleState::Ready);

    rig.load("city", "city.glb").await.expect("load");
    let before = rig.viewer.borrow().camera().expect("camera");
    let route = rig.viewer.borrow_mut().handle_key(&Key::ArrowUp);
    assert!(matches!(route, KeyRoute::Move(_)));
    let after = rig.viewer.borrow().camera().expect("camera");

    let forward = (Vec3::from(before.target) - Vec3::from(before.position)).normalize();
    let expected = Vec3::from(before.position) + forward * 0.2;
    let moved = Vec3::from(after.position);
    assert_relative_eq!(moved.x, expected.x, epsilon = 1e-5);
    assert_relative_eq!(moved.y, expected.y, epsilon = 1e-5);
    assert_relative_eq!(moved.z, expected.z, epsilon = 1e-5);
    assert_relative_eq!((moved - Vec3::from(before.position)).length(), 0.2, epsilon = 1e-5);
}

#[tokio::test]
async fn unavailable_loaders_block_loading() {
    let rig = Rig::with_provisioner(LoaderProvisioner::new(vec![Box::new(PreRegistered::new())]));
    let err = rig.load("city", "city.glb").await.unwrap_err();
    assert!(matches!(err, ViewerError::LoadersUnavailable(_)));

    let viewer = rig.viewer.borrow();
    assert_eq!(viewer.state(), &LifecycleState::LoadersPending);
    assert!(viewer.resources().is_none());
    assert!(!viewer.can_select_file());
    assert_eq!(rig.backend.ledger().renderers_created, 0);
    assert_eq!(rig.mounted(), 0);
}

#[tokio::test]
async fn frames_render_and_reschedule() {
    let rig = Rig::new();
    rig.load("city", "city.glb").await.expect("load");
    let outcomes = rig.pump(4);
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, FrameOutcome::Rendered { .. })));

    let ledger = rig.backend.ledger();
    assert_eq!(ledger.render_count, 4);
    // Ambient light, directional light, model.
    assert_eq!(ledger.last_scene_len, 3);
    drop(ledger);
    let viewer = rig.viewer.borrow();
    let set = viewer.resources().expect("set");
    assert_eq!(set.frames(), 4);
    assert!(set.perf().fps() > 0.0);
}

#[tokio::test]
async fn render_failure_stops_the_loop_but_keeps_resources() {
    let rig = Rig::new();
    rig.backend.fail_render_after(2);
    rig.load("city", "city.glb").await.expect("load");

    let outcomes = rig.pump(5);
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(
        outcomes.last(),
        Some(FrameOutcome::Failed(ViewerError::RenderFailure(_)))
    ));
    assert!(rig.host.state().pending_frames.is_empty());
    {
        let viewer = rig.viewer.borrow();
        let set = viewer.resources().expect("set survives");
        assert_eq!(set.loop_state(), LoopState::Failed);
        assert!(viewer.status().error.is_some());
    }

    let report = rig.viewer.borrow_mut().teardown();
    assert!(report.is_clean());
    assert!(rig.backend.ledger().live_surfaces.is_empty());
}

#[tokio::test]
async fn stale_frames_after_teardown_are_ignored() {
    let rig = Rig::new();
    rig.load("city", "city.glb").await.expect("load");
    let due = rig.host.state().pending_frames.iter().copied().collect::<Vec<_>>();
    rig.viewer.borrow_mut().teardown();
    for frame in due {
        assert_eq!(
            rig.viewer.borrow_mut().on_animation_frame(frame, 0.0),
            FrameOutcome::Stale
        );
    }
    assert_eq!(rig.backend.ledger().render_count, 0);
}

#[tokio::test]
async fn resize_follows_the_host_viewport() {
    let rig = Rig::new();
    rig.viewer.borrow_mut().handle_resize();
    rig.load("city", "city.glb").await.expect("load");

    rig.host.set_viewport(Viewport {
        width: 1000,
        height: 500,
        scale_factor: 2.0,
    });
    rig.viewer.borrow_mut().handle_resize();
    assert_eq!(rig.backend.ledger().last_size, Some((1000, 500, 2.0)));
    let camera = rig.viewer.borrow().camera().expect("camera");
    assert_relative_eq!(camera.aspect, 2.0);
}

#[tokio::test]
async fn backend_failure_leaves_controller_ready() {
    let rig = Rig::new();
    rig.backend.fail_create(true);
    let err = rig.load("city", "city.glb").await.unwrap_err();
    assert!(matches!(err, ViewerError::Backend(_)));
    assert_eq!(rig.viewer.borrow().state(), &LifecycleState::Ready);
    assert_eq!(rig.mounted(), 0);

    rig.backend.fail_create(false);
    rig.load("city", "city.glb").await.expect("retry");
    assert_eq!(rig.mounted(), 1);
}

#[tokio::test]
async fn escape_confirm_disposes_and_navigates_away() {
    let rig = Rig::new();
    rig.load("city", "city.glb").await.expect("load");
    rig.viewer.borrow_mut().drain_events();

    assert_eq!(
        rig.viewer.borrow_mut().handle_key(&Key::Escape),
        KeyRoute::ExitPrompt
    );
    let report = rig.viewer.borrow_mut().confirm_exit().expect("report");
    assert!(report.released.is_some());
    assert_eq!(rig.mounted(), 0);
    assert_eq!(rig.host.listener_count(ListenerKind::KeyDown), 0);
    assert_eq!(
        rig.viewer.borrow_mut().drain_events(),
        [ViewerEvent::ExitPromptShown, ViewerEvent::NavigateAway]
    );
}
