// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resource-lifecycle core of the Vista scene viewer.
//!
//! The [`ViewerController`] accepts a scene asset, builds exactly one
//! [`ResourceSet`] for it, drives its [`RenderLoop`] from host frame callbacks
//! and releases every handle exactly once on reload, teardown or dispose.
//! Decoder and navigation constructors come from a resolve-once
//! [`LoaderProvisioner`].
//!
//! Everything here runs on one cooperative thread. Collaborators are reached
//! through the `vista-scene-port` traits; the headless adapters in
//! `vista-scene-codec` are enough to drive the whole lifecycle in tests.
// Loader and decode futures hold `Rc` state and run on the host's local executor.
#![allow(clippy::future_not_send)]

mod controller;
mod error;
mod event;
mod exit_prompt;
mod handle;
mod input;
mod navigation;
mod perf;
mod provisioner;
mod render_loop;
mod resources;

pub use controller::{
    DecodedAsset, LifecycleState, LoadOutcome, LoadTicket, PendingLoad, ViewerController,
};
pub use error::{DisposerError, TeardownReport, TeardownStep, ViewerError};
pub use event::{ViewerEvent, ViewerStatus};
pub use exit_prompt::{reduce as reduce_prompt, ExitPrompt, PromptEffect, PromptEvent};
pub use handle::ViewerHandle;
pub use input::{movement_basis, route_key, Key, KeyRoute, DEFAULT_STEP};
pub use navigation::OrbitControls;
pub use perf::PerfStats;
pub use provisioner::{
    BuiltinModules, DecoderFactory, LoaderBundle, LoaderProvisioner, LoaderRegistry,
    LoaderSource, NavigationFactory, PreRegistered, Readiness, Resolution, SourceError,
};
pub use render_loop::{FrameOutcome, LoopState, RenderLoop};
pub use resources::{ResourceSet, ResourceSetId};
