// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level application wiring and event loop handler.
//!
//! Loads run as local tasks on a current-thread runtime; the event loop
//! drives them from `about_to_wait` and polls continuously while any are
//! in flight.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use bytes::Bytes;
use glam::Mat4;
use tokio::task::LocalSet;
use tracing::{debug, error, info, warn};
use vista_app_core::config::ConfigService;
use vista_app_core::config_port::ConfigPort;
use vista_app_core::prefs::ViewerPrefs;
use vista_app_core::toast::ToastKind;
use vista_config_fs::FsConfigStore;
use vista_scene_codec::is_supported_asset;
use vista_scene_port::ListenerKind;
use vista_viewer::{
    ExitPrompt, LoaderProvisioner, PreRegistered, ViewerController, ViewerEvent, ViewerHandle,
};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::backend::WgpuBackend;
use crate::gpu::Gpu;
use crate::host::WindowHost;
use crate::keys::{map_key, KeyInput};
use crate::outline::clear_color;
use crate::window_port::WinitWindow;

const NOTICE_TTL: Duration = Duration::from_secs(4);
const PROMPT_TITLE: &str = "Leave the viewer? Enter to confirm, Backspace to stay";

struct Session {
    window: &'static Window,
    gpu: Rc<RefCell<Gpu>>,
    host: WindowHost,
    viewer: ViewerHandle,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

pub struct App {
    initial: Option<PathBuf>,
    config: Option<Box<dyn ConfigPort>>,
    prefs: ViewerPrefs,
    rt: tokio::runtime::Runtime,
    local: LocalSet,
    in_flight: Rc<Cell<usize>>,
    session: Option<Session>,
    started: Instant,
    title: String,
}

impl App {
    pub fn new(initial: Option<PathBuf>) -> Result<Self> {
        let config = FsConfigStore::new()
            .map(ConfigService::new)
            .map(|svc| Box::new(svc) as Box<dyn ConfigPort>)
            .ok();
        if config.is_none() {
            warn!("config store unavailable; prefs won't persist this session");
        }
        let prefs = config
            .as_ref()
            .and_then(|c| c.load_prefs())
            .unwrap_or_default();
        let rt = tokio::runtime::Builder::new_current_thread().build()?;
        Ok(Self {
            initial,
            config,
            prefs,
            rt,
            local: LocalSet::new(),
            in_flight: Rc::new(Cell::new(0)),
            session: None,
            started: Instant::now(),
            title: String::new(),
        })
    }

    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop.create_window(
            WindowAttributes::default()
                .with_title("Vista")
                .with_visible(true),
        )?;
        let window: &'static Window = Box::leak(Box::new(window));
        let gpu = Rc::new(RefCell::new(pollster::block_on(Gpu::new(window))?));
        let host = WindowHost::new(Rc::new(WinitWindow::new(window)));
        let controller = ViewerController::new(
            Box::new(WgpuBackend::new(Rc::clone(&gpu))),
            Box::new(host.clone()),
            self.prefs.clone(),
        );
        let viewer = ViewerHandle::new(
            controller,
            LoaderProvisioner::with_fallback(PreRegistered::new()),
        );

        let resolving = viewer.clone();
        self.spawn(async move {
            let readiness = resolving.ensure_loaders().await;
            info!(?readiness, "loaders resolved");
        });
        if let Some(path) = self.initial.take() {
            self.open(&viewer, &path);
        }
        self.session = Some(Session {
            window,
            gpu,
            host,
            viewer,
            dragging: false,
            cursor: None,
        });
        self.refresh_title();
        Ok(())
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let in_flight = Rc::clone(&self.in_flight);
        in_flight.set(in_flight.get() + 1);
        drop(self.local.spawn_local(async move {
            fut.await;
            in_flight.set(in_flight.get() - 1);
        }));
    }

    /// Run ready local tasks once.
    fn pump(&self) {
        self.local.block_on(&self.rt, tokio::task::yield_now());
    }

    fn open(&self, viewer: &ViewerHandle, path: &Path) {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        if !is_supported_asset(&name) {
            warn!(%name, "ignoring unsupported file");
            notice(viewer, format!("Unsupported file: {name}"));
            return;
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                warn!(%name, error = %err, "failed to read asset");
                notice(viewer, format!("Could not read {name}"));
                return;
            }
        };
        info!(%name, bytes = bytes.len(), "opening asset");
        let viewer = viewer.clone();
        self.spawn(async move {
            if let Err(err) = viewer.load_asset(bytes, &name).await {
                debug!(error = %err, "load did not complete");
            }
        });
    }

    /// Handle queued viewer events; leaves the app on `NavigateAway`.
    fn drain(&mut self, event_loop: &ActiveEventLoop) {
        let Some(s) = &self.session else { return };
        let events = s.viewer.borrow_mut().drain_events();
        let mut leave = false;
        for ev in events {
            match ev {
                ViewerEvent::SceneReady { set, name } => info!(%set, %name, "scene ready"),
                ViewerEvent::NavigateAway => leave = true,
                ViewerEvent::Error(err) => debug!(error = %err, "viewer reported an error"),
                ViewerEvent::ExitPromptShown | ViewerEvent::ExitPromptHidden => {}
            }
        }
        if leave {
            self.shutdown(event_loop);
            return;
        }
        self.refresh_title();
    }

    fn refresh_title(&mut self) {
        let Some(s) = &self.session else { return };
        let now = Instant::now();
        let text = {
            let mut c = s.viewer.borrow_mut();
            c.toasts_mut().retain_visible(now);
            if c.prompt() == ExitPrompt::Shown {
                PROMPT_TITLE.to_owned()
            } else if let Some(toast) = c.toasts().latest(ToastKind::Warn) {
                toast.label()
            } else {
                c.status().headline()
            }
        };
        let title = format!("Vista | {text}");
        if title != self.title {
            s.window.set_title(&title);
            self.title = title;
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(s) = self.session.take() {
            let report = s.viewer.borrow_mut().dispose();
            if !report.is_clean() {
                warn!(errors = report.errors.len(), "viewer teardown reported errors");
            }
            if let Some(cfg) = &self.config {
                cfg.save_prefs(s.viewer.borrow().prefs());
            }
        }
        event_loop.exit();
    }
}

fn notice(viewer: &ViewerHandle, title: String) {
    viewer.borrow_mut().toasts_mut().push(
        ToastKind::Warn,
        title,
        Some("Drop a .gltf or .glb file".to_owned()),
        NOTICE_TTL,
        Instant::now(),
    );
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        if let Err(err) = self.start_session(event_loop) {
            error!(error = %err, "failed to start viewer");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        if s.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
                return;
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let size = s.window.inner_size();
                s.gpu.borrow_mut().resize(size.width, size.height);
                if s.host.listening(ListenerKind::Resize) {
                    s.viewer.borrow_mut().handle_resize();
                }
            }
            WindowEvent::DroppedFile(path) => {
                let viewer = s.viewer.clone();
                self.open(&viewer, &path);
            }
            WindowEvent::KeyboardInput { event: key, .. } if key.state == ElementState::Pressed => {
                match map_key(&key.logical_key) {
                    Some(KeyInput::Viewer(k)) => {
                        let route = s.viewer.borrow_mut().handle_key(&k);
                        debug!(key = k.code(), ?route, "key routed");
                    }
                    Some(KeyInput::Confirm) => {
                        if s.viewer.borrow_mut().confirm_exit().is_some() {
                            info!("exit confirmed");
                        }
                    }
                    Some(KeyInput::Dismiss) => s.viewer.borrow_mut().dismiss_exit(),
                    None => {}
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => s.dragging = state == ElementState::Pressed,
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (s.dragging, s.cursor) {
                    s.viewer.borrow_mut().handle_pointer_drag(
                        (position.x - last.x) as f32,
                        (position.y - last.y) as f32,
                    );
                }
                s.cursor = Some(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                s.viewer.borrow_mut().handle_zoom(1.0 - y * 0.05);
            }
            WindowEvent::RedrawRequested => {
                let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
                for handle in s.host.take_due_frames() {
                    s.viewer.borrow_mut().on_animation_frame(handle, now_ms);
                }
                if !s.host.has_mount() {
                    let idle = s.gpu.borrow_mut().draw(
                        clear_color(self.prefs.scene.background),
                        Mat4::IDENTITY,
                        &[],
                    );
                    if let Err(err) = idle {
                        warn!(error = %err, "failed to clear idle window");
                    }
                }
            }
            _ => {}
        }
        self.drain(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_none() {
            return;
        }
        self.pump();
        self.drain(event_loop);
        let flow = if self.in_flight.get() > 0 {
            ControlFlow::Poll
        } else {
            ControlFlow::Wait
        };
        event_loop.set_control_flow(flow);
    }
}
