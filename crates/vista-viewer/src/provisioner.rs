// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolve-once provisioning of the decoder and navigation constructors.
//!
//! Sources are tried in order and the first one that provides a constructor
//! wins for that constructor. Resolution never fails: a constructor nobody
//! provides ends up [`Resolution::Unavailable`] with the collected reasons.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use vista_scene_port::{NavigationController, SceneDecoder};

use crate::error::ViewerError;
use crate::navigation::OrbitControls;

/// Builds a fresh decoder for one load.
pub type DecoderFactory = Rc<dyn Fn() -> Box<dyn SceneDecoder>>;

/// Builds a fresh navigation controller for one resource set.
pub type NavigationFactory = Rc<dyn Fn() -> Box<dyn NavigationController>>;

/// Resolution state of one constructor.
pub enum Resolution<T> {
    /// Not resolved yet.
    Pending,
    /// Resolved by the named source.
    Resolved {
        /// The constructor.
        value: T,
        /// Name of the source that provided it.
        source: &'static str,
    },
    /// No source could provide it.
    Unavailable {
        /// Why, per failing source.
        reason: String,
    },
}

impl<T> Resolution<T> {
    /// The constructor, when resolved.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Resolved { value, .. } => Some(value),
            _ => None,
        }
    }

    /// True when resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Name of the providing source, when resolved.
    pub fn source(&self) -> Option<&'static str> {
        match self {
            Self::Resolved { source, .. } => Some(*source),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Resolved { source, .. } => {
                f.debug_struct("Resolved").field("source", source).finish()
            }
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Constructors available to the viewer. Immutable once resolved.
#[derive(Debug)]
pub struct LoaderRegistry {
    /// Scene decoder constructor.
    pub decoder: Resolution<DecoderFactory>,
    /// Navigation controller constructor.
    pub navigation: Resolution<NavigationFactory>,
}

impl LoaderRegistry {
    /// Registry with nothing resolved.
    pub fn pending() -> Self {
        Self {
            decoder: Resolution::Pending,
            navigation: Resolution::Pending,
        }
    }

    /// Decoder constructor, or the reason loading is blocked.
    pub fn decoder(&self) -> Result<&DecoderFactory, ViewerError> {
        match &self.decoder {
            Resolution::Resolved { value, .. } => Ok(value),
            Resolution::Pending => Err(ViewerError::LoadersUnavailable(
                "scene decoder not resolved yet".into(),
            )),
            Resolution::Unavailable { reason } => {
                Err(ViewerError::LoadersUnavailable(reason.clone()))
            }
        }
    }
}

/// Readiness flag gating the "select file" affordance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Readiness {
    /// Resolution has not finished.
    #[default]
    Pending,
    /// A decoder is available.
    Ready,
    /// No decoder could be resolved.
    Unavailable,
}

/// Constructors offered by one source. Either may be absent.
#[derive(Default, Clone)]
pub struct LoaderBundle {
    /// Decoder constructor.
    pub decoder: Option<DecoderFactory>,
    /// Navigation constructor.
    pub navigation: Option<NavigationFactory>,
}

/// A source failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SourceError(pub String);

/// One link of the resolution chain.
pub trait LoaderSource {
    /// Name used in logs and in [`Resolution::Resolved::source`].
    fn name(&self) -> &'static str;

    /// Resolve whatever constructors this source can offer.
    fn resolve(&self) -> LocalBoxFuture<'_, Result<LoaderBundle, SourceError>>;
}

/// The crate's own constructors: glTF decoder (feature `gltf`) and orbit controls.
///
/// Nothing is built until the chain reaches this source.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinModules;

impl BuiltinModules {
    /// Create the source.
    pub fn new() -> Self {
        Self
    }
}

impl LoaderSource for BuiltinModules {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn resolve(&self) -> LocalBoxFuture<'_, Result<LoaderBundle, SourceError>> {
        async {
            let navigation: NavigationFactory =
                Rc::new(|| Box::new(OrbitControls::new()) as Box<dyn NavigationController>);
            Ok(LoaderBundle {
                decoder: builtin_decoder(),
                navigation: Some(navigation),
            })
        }
        .boxed_local()
    }
}

#[cfg(feature = "gltf")]
fn builtin_decoder() -> Option<DecoderFactory> {
    Some(Rc::new(|| {
        Box::new(vista_scene_codec::GltfDecoder::new()) as Box<dyn SceneDecoder>
    }))
}

#[cfg(not(feature = "gltf"))]
fn builtin_decoder() -> Option<DecoderFactory> {
    None
}

/// Constructors handed to the provisioner explicitly by the embedding host.
#[derive(Default, Clone)]
pub struct PreRegistered {
    bundle: LoaderBundle,
}

impl PreRegistered {
    /// Empty source; resolves to an error until something is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder constructor.
    pub fn with_decoder(mut self, factory: DecoderFactory) -> Self {
        self.bundle.decoder = Some(factory);
        self
    }

    /// Register a navigation constructor.
    pub fn with_navigation(mut self, factory: NavigationFactory) -> Self {
        self.bundle.navigation = Some(factory);
        self
    }
}

impl LoaderSource for PreRegistered {
    fn name(&self) -> &'static str {
        "pre-registered"
    }

    fn resolve(&self) -> LocalBoxFuture<'_, Result<LoaderBundle, SourceError>> {
        let bundle = self.bundle.clone();
        async move {
            if bundle.decoder.is_none() && bundle.navigation.is_none() {
                return Err(SourceError("no constructors registered".into()));
            }
            Ok(bundle)
        }
        .boxed_local()
    }
}

/// Resolves the [`LoaderRegistry`] exactly once per provisioner.
pub struct LoaderProvisioner {
    sources: Vec<Box<dyn LoaderSource>>,
    registry: OnceCell<Rc<LoaderRegistry>>,
    attempts: Cell<u32>,
    readiness: Cell<Readiness>,
}

impl LoaderProvisioner {
    /// Provisioner trying `sources` in order.
    pub fn new(sources: Vec<Box<dyn LoaderSource>>) -> Self {
        Self {
            sources,
            registry: OnceCell::new(),
            attempts: Cell::new(0),
            readiness: Cell::new(Readiness::Pending),
        }
    }

    /// Built-in modules first, then `registered`.
    pub fn with_fallback(registered: PreRegistered) -> Self {
        Self::new(vec![Box::new(BuiltinModules::new()), Box::new(registered)])
    }

    /// Resolve the registry, or wait for the resolution already in flight.
    ///
    /// Every caller gets the same registry.
    pub async fn ensure_loaders(&self) -> Rc<LoaderRegistry> {
        let registry = self.registry.get_or_init(|| self.resolve_chain()).await;
        Rc::clone(registry)
    }

    /// The resolved registry, if resolution has finished.
    pub fn registry(&self) -> Option<Rc<LoaderRegistry>> {
        self.registry.get().cloned()
    }

    /// Current readiness.
    pub fn readiness(&self) -> Readiness {
        self.readiness.get()
    }

    /// Number of resolution attempts started (at most one).
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    async fn resolve_chain(&self) -> Rc<LoaderRegistry> {
        self.attempts.set(self.attempts.get() + 1);
        let mut registry = LoaderRegistry::pending();
        let mut failures = Vec::new();

        for source in &self.sources {
            if registry.decoder.is_resolved() && registry.navigation.is_resolved() {
                break;
            }
            match source.resolve().await {
                Ok(bundle) => {
                    if let (false, Some(value)) = (registry.decoder.is_resolved(), bundle.decoder)
                    {
                        registry.decoder = Resolution::Resolved {
                            value,
                            source: source.name(),
                        };
                    }
                    if let (false, Some(value)) =
                        (registry.navigation.is_resolved(), bundle.navigation)
                    {
                        registry.navigation = Resolution::Resolved {
                            value,
                            source: source.name(),
                        };
                    }
                }
                Err(err) => {
                    warn!(source = source.name(), error = %err, "loader source failed");
                    failures.push(format!("{}: {err}", source.name()));
                }
            }
        }

        let reason = |what: &str| {
            if failures.is_empty() {
                format!("no source provides a {what}")
            } else {
                format!("no source provides a {what} ({})", failures.join("; "))
            }
        };
        if !registry.decoder.is_resolved() {
            registry.decoder = Resolution::Unavailable {
                reason: reason("scene decoder"),
            };
        }
        if !registry.navigation.is_resolved() {
            registry.navigation = Resolution::Unavailable {
                reason: reason("navigation controller"),
            };
        }

        let readiness = if registry.decoder.is_resolved() {
            Readiness::Ready
        } else {
            Readiness::Unavailable
        };
        self.readiness.set(readiness);
        info!(
            ?readiness,
            decoder = ?registry.decoder,
            navigation = ?registry.navigation,
            "loaders resolved"
        );
        Rc::new(registry)
    }
}

impl fmt::Debug for LoaderProvisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderProvisioner")
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("readiness", &self.readiness.get())
            .field("attempts", &self.attempts.get())
            .finish_non_exhaustive()
    }
}
