// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level orchestrator: owns at most one [`ResourceSet`] at any instant.
//!
//! Loading is split so the host loop owns the only suspension point:
//! [`ViewerController::begin_load`] validates and tears down synchronously,
//! [`PendingLoad::decode`] awaits the decoder, and
//! [`ViewerController::finish_load`] builds the new set, unless the load was
//! superseded in the meantime.

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};
use vista_app_core::prefs::ViewerPrefs;
use vista_app_core::toast::{ToastKind, ToastService};
use vista_scene_port::{
    CameraState, DecodeError, DecodeFuture, FrameHandle, HostPort, ListenerHandle, ListenerKind,
    RenderBackend, SceneNode,
};

use crate::error::{DisposerError, TeardownReport, TeardownStep, ViewerError};
use crate::event::{ViewerEvent, ViewerStatus};
use crate::exit_prompt::{self, ExitPrompt, PromptEffect, PromptEvent};
use crate::input::{route_key, Key, KeyRoute};
use crate::provisioner::LoaderRegistry;
use crate::render_loop::FrameOutcome;
use crate::resources::{BuildContext, ResourceSet, ResourceSetId};

const ERROR_TOAST_TTL: Duration = Duration::from_secs(6);

/// Generation number of one load request.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

/// Lifecycle of the viewer as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing requested yet.
    Idle,
    /// Loader resolution in flight, or it found no decoder.
    LoadersPending,
    /// Loaders resolved, no scene.
    Ready,
    /// A decode is in flight.
    Loading {
        /// Ticket that may complete this load.
        ticket: LoadTicket,
        /// Display name of the asset.
        name: String,
    },
    /// A resource set is live.
    Active {
        /// The live set.
        set: ResourceSetId,
    },
    /// A resource set is being released.
    TearingDown,
    /// Retired; every operation is a no-op or fails with `Disposed`.
    Disposed,
}

/// A load whose decode has not run yet.
pub struct PendingLoad {
    ticket: LoadTicket,
    name: String,
    decode: DecodeFuture,
}

impl PendingLoad {
    /// Ticket identifying this load.
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    /// Display name of the asset.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the decoder.
    pub async fn decode(self) -> DecodedAsset {
        let result = self.decode.await;
        DecodedAsset {
            ticket: self.ticket,
            name: self.name,
            result,
        }
    }
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("ticket", &self.ticket)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Decoder output tagged with the ticket it belongs to.
#[derive(Debug)]
pub struct DecodedAsset {
    /// Ticket of the originating load.
    pub ticket: LoadTicket,
    /// Display name of the asset.
    pub name: String,
    /// Decoded scene or the decoder's error.
    pub result: Result<SceneNode, DecodeError>,
}

/// How a completed load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The scene is live in this set.
    Active(ResourceSetId),
    /// A newer load or a teardown superseded this one; nothing changed.
    Superseded,
}

/// Owns the current resource set and the host-facing lifecycle.
pub struct ViewerController {
    backend: Box<dyn RenderBackend>,
    host: Box<dyn HostPort>,
    prefs: ViewerPrefs,
    registry: Option<Rc<LoaderRegistry>>,
    state: LifecycleState,
    resources: Option<ResourceSet>,
    next_ticket: u64,
    next_set: u64,
    key_listener: Option<ListenerHandle>,
    prompt: ExitPrompt,
    events: Vec<ViewerEvent>,
    last_error: Option<ViewerError>,
    toasts: ToastService,
}

impl ViewerController {
    /// Create a controller and register its keydown listener.
    pub fn new(
        backend: Box<dyn RenderBackend>,
        mut host: Box<dyn HostPort>,
        prefs: ViewerPrefs,
    ) -> Self {
        let key_listener = host.add_listener(ListenerKind::KeyDown);
        Self {
            backend,
            host,
            prefs,
            registry: None,
            state: LifecycleState::Idle,
            resources: None,
            next_ticket: 0,
            next_set: 0,
            key_listener: Some(key_listener),
            prompt: ExitPrompt::Hidden,
            events: Vec::new(),
            last_error: None,
            toasts: ToastService::new(8),
        }
    }

    /// Note that loader resolution has started.
    pub fn mark_loaders_pending(&mut self) {
        if self.state == LifecycleState::Idle {
            self.state = LifecycleState::LoadersPending;
        }
    }

    /// Install the resolved registry.
    ///
    /// Without a decoder the controller stays `LoadersPending` and reports
    /// `LoadersUnavailable`.
    pub fn attach_loaders(&mut self, registry: Rc<LoaderRegistry>) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        let decoder = registry.decoder().map(|_| ());
        self.registry = Some(registry);
        match decoder {
            Ok(()) => {
                if matches!(
                    self.state,
                    LifecycleState::Idle | LifecycleState::LoadersPending
                ) {
                    info!("loaders ready");
                    self.state = LifecycleState::Ready;
                }
            }
            Err(err) => {
                self.state = LifecycleState::LoadersPending;
                self.record_error(err);
            }
        }
    }

    /// True once a registry has been installed, usable or not.
    pub fn has_loaders(&self) -> bool {
        self.registry.is_some()
    }

    /// Start loading `buffer`: validate, tear down the current set and
    /// hand back the decode to await.
    ///
    /// Nothing is torn down when validation fails.
    #[instrument(skip(self, buffer), fields(bytes = buffer.len()))]
    pub fn begin_load(&mut self, buffer: Bytes, name: &str) -> Result<PendingLoad, ViewerError> {
        if self.state == LifecycleState::Disposed {
            return Err(ViewerError::Disposed);
        }
        if buffer.is_empty() {
            return Err(self.record_error(ViewerError::EmptyAsset));
        }
        let factory = match self.registry.as_ref().map(|r| r.decoder().cloned()) {
            Some(Ok(factory)) => factory,
            Some(Err(err)) => return Err(self.record_error(err)),
            None => {
                return Err(self.record_error(ViewerError::LoadersUnavailable(
                    "loaders have not been resolved".into(),
                )))
            }
        };

        self.teardown();
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.last_error = None;
        self.state = LifecycleState::Loading {
            ticket,
            name: name.to_owned(),
        };
        info!(ticket = ticket.0, "decoding asset");
        let decode = factory().parse(buffer);
        Ok(PendingLoad {
            ticket,
            name: name.to_owned(),
            decode,
        })
    }

    /// Complete a load. A ticket that is no longer current is a no-op.
    pub fn finish_load(&mut self, decoded: DecodedAsset) -> Result<LoadOutcome, ViewerError> {
        let DecodedAsset {
            ticket,
            name,
            result,
        } = decoded;
        let current = matches!(&self.state, LifecycleState::Loading { ticket: t, .. } if *t == ticket);
        if !current {
            debug!(ticket = ticket.0, "discarding superseded decode");
            return Ok(LoadOutcome::Superseded);
        }

        let model = match result {
            Ok(model) => model,
            Err(err) => {
                self.state = LifecycleState::Ready;
                return Err(self.record_error(ViewerError::DecodeFailed(err.to_string())));
            }
        };

        let Some(registry) = self.registry.clone() else {
            self.state = LifecycleState::LoadersPending;
            return Err(self.record_error(ViewerError::LoadersUnavailable(
                "loaders have not been resolved".into(),
            )));
        };
        self.next_set += 1;
        let id = ResourceSetId(self.next_set);
        let built = ResourceSet::build(
            id,
            &name,
            model,
            BuildContext {
                backend: self.backend.as_mut(),
                host: self.host.as_mut(),
                registry: &registry,
                prefs: &self.prefs,
            },
        );
        match built {
            Ok(set) => {
                self.resources = Some(set);
                self.state = LifecycleState::Active { set: id };
                self.events.push(ViewerEvent::SceneReady { set: id, name });
                Ok(LoadOutcome::Active(id))
            }
            Err(err) => {
                self.state = LifecycleState::Ready;
                Err(self.record_error(err))
            }
        }
    }

    /// Release the current resource set, if any. Idempotent and best-effort.
    ///
    /// Tearing down while `Loading` supersedes the in-flight decode.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) -> TeardownReport {
        match self.state {
            LifecycleState::Disposed => return TeardownReport::default(),
            LifecycleState::Loading { .. } => {
                debug!("superseding in-flight load");
                self.state = LifecycleState::Ready;
            }
            _ => {}
        }
        let Some(set) = self.resources.take() else {
            return TeardownReport::default();
        };
        self.state = LifecycleState::TearingDown;
        let report = set.release(self.host.as_mut());
        self.state = LifecycleState::Ready;
        info!(errors = report.errors.len(), "teardown complete");
        report
    }

    /// Follow the host viewport. No-op without a resource set.
    pub fn handle_resize(&mut self) {
        let viewport = self.host.viewport();
        if let Some(set) = self.resources.as_mut() {
            set.resize(viewport);
        }
    }

    /// Route a key press. Arrows move the camera of the live set; Escape
    /// opens the exit prompt with or without one.
    pub fn handle_key(&mut self, key: &Key) -> KeyRoute {
        if self.key_listener.is_none() {
            return KeyRoute::Ignored;
        }
        let route = match self.resources.as_ref() {
            Some(set) => route_key(set.camera(), key, self.prefs.movement.step),
            None if *key == Key::Escape => KeyRoute::ExitPrompt,
            None => KeyRoute::Ignored,
        };
        match &route {
            KeyRoute::Move(camera) => {
                if let Some(set) = self.resources.as_mut() {
                    set.set_camera(*camera);
                }
                debug!(key = key.code(), position = ?camera.position, "camera moved");
            }
            KeyRoute::ExitPrompt => self.request_exit(),
            KeyRoute::Ignored => {}
        }
        route
    }

    /// Forward a pointer drag (physical pixels) to the navigation controller.
    pub fn handle_pointer_drag(&mut self, dx: f32, dy: f32) {
        let speed = self.prefs.navigation.rotate_speed;
        if let Some(set) = self.resources.as_mut() {
            set.orbit(dx * speed, dy * speed);
        }
    }

    /// Forward a zoom step (< 1 zooms in).
    pub fn handle_zoom(&mut self, scale: f32) {
        if let Some(set) = self.resources.as_mut() {
            set.zoom(scale);
        }
    }

    /// Deliver a host animation frame.
    pub fn on_animation_frame(&mut self, handle: FrameHandle, timestamp_ms: f64) -> FrameOutcome {
        let Some(set) = self.resources.as_mut() else {
            return FrameOutcome::Stale;
        };
        let outcome = set.on_frame(handle, timestamp_ms, self.host.as_mut());
        if let FrameOutcome::Failed(err) = &outcome {
            self.record_error(err.clone());
        }
        outcome
    }

    /// Open the exit prompt (Escape or the exit button).
    pub fn request_exit(&mut self) {
        self.apply_prompt(PromptEvent::Request);
    }

    /// Close the exit prompt and stay.
    pub fn dismiss_exit(&mut self) {
        self.apply_prompt(PromptEvent::Dismiss);
    }

    /// Confirm the exit prompt: dispose, then signal `NavigateAway`.
    ///
    /// Returns the disposal report, or `None` when no prompt was shown.
    pub fn confirm_exit(&mut self) -> Option<TeardownReport> {
        self.apply_prompt(PromptEvent::Confirm)
    }

    fn apply_prompt(&mut self, ev: PromptEvent) -> Option<TeardownReport> {
        if self.state == LifecycleState::Disposed {
            return None;
        }
        let (next, effects) = exit_prompt::reduce(self.prompt, ev);
        self.prompt = next;
        let mut report = None;
        for effect in effects {
            match effect {
                PromptEffect::Show => self.events.push(ViewerEvent::ExitPromptShown),
                PromptEffect::Hide => self.events.push(ViewerEvent::ExitPromptHidden),
                PromptEffect::Dispose => report = Some(self.dispose()),
                PromptEffect::NavigateAway => self.events.push(ViewerEvent::NavigateAway),
            }
        }
        report
    }

    /// Tear down and remove the keydown listener. Repeated calls are no-ops.
    #[instrument(skip(self))]
    pub fn dispose(&mut self) -> TeardownReport {
        if self.state == LifecycleState::Disposed {
            return TeardownReport::default();
        }
        let mut report = self.teardown();
        if let Some(listener) = self.key_listener.take() {
            if let Err(reason) = self.host.remove_listener(listener) {
                warn!(error = %reason, "failed to remove key listener");
                report.merge(TeardownReport {
                    released: None,
                    errors: vec![DisposerError {
                        step: TeardownStep::RemoveKeyListener,
                        reason,
                    }],
                });
            }
        }
        self.state = LifecycleState::Disposed;
        self.prompt = ExitPrompt::Disposed;
        info!("viewer disposed");
        report
    }

    /// Record `err` as the current error, toast it and queue an event.
    fn record_error(&mut self, err: ViewerError) -> ViewerError {
        warn!(error = %err, "viewer error");
        self.toasts.push(
            ToastKind::Error,
            err.to_string(),
            None,
            ERROR_TOAST_TTL,
            Instant::now(),
        );
        self.last_error = Some(err.clone());
        self.events.push(ViewerEvent::Error(err.clone()));
        err
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Status overlay snapshot.
    pub fn status(&self) -> ViewerStatus {
        let (scene_name, loading) = match &self.state {
            LifecycleState::Loading { name, .. } => (Some(name.clone()), true),
            _ => (self.resources.as_ref().map(|s| s.name().to_owned()), false),
        };
        ViewerStatus {
            state: self.state.clone(),
            scene_name,
            loading,
            error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// The live resource set.
    pub fn resources(&self) -> Option<&ResourceSet> {
        self.resources.as_ref()
    }

    /// Camera of the live set.
    pub fn camera(&self) -> Option<CameraState> {
        self.resources.as_ref().map(|s| *s.camera())
    }

    /// Exit prompt state.
    pub fn prompt(&self) -> ExitPrompt {
        self.prompt
    }

    /// Most recent error, cleared by the next accepted load.
    pub fn last_error(&self) -> Option<&ViewerError> {
        self.last_error.as_ref()
    }

    /// User-facing toasts.
    pub fn toasts(&self) -> &ToastService {
        &self.toasts
    }

    /// Mutable toasts, for expiring them each frame.
    pub fn toasts_mut(&mut self) -> &mut ToastService {
        &mut self.toasts
    }

    /// Preferences this controller was built with.
    pub fn prefs(&self) -> &ViewerPrefs {
        &self.prefs
    }

    /// The controller's keydown listener, until disposal.
    pub fn key_listener(&self) -> Option<ListenerHandle> {
        self.key_listener
    }

    /// True when a decoder is installed and the controller is not retired.
    pub fn can_select_file(&self) -> bool {
        self.state != LifecycleState::Disposed
            && self
                .registry
                .as_ref()
                .is_some_and(|r| r.decoder.is_resolved())
    }
}

impl fmt::Debug for ViewerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerController")
            .field("state", &self.state)
            .field("resources", &self.resources)
            .field("prompt", &self.prompt)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
