// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared handle chaining loader resolution and loads on the host loop.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use bytes::Bytes;
use tracing::instrument;

use crate::controller::{LifecycleState, LoadOutcome, ViewerController};
use crate::error::ViewerError;
use crate::provisioner::{LoaderProvisioner, Readiness};

/// Cloneable handle to one controller and its provisioner.
///
/// No borrow of the controller is held across an await, so frame, key and
/// resize callbacks can run while a load is decoding.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    controller: Rc<RefCell<ViewerController>>,
    provisioner: Rc<LoaderProvisioner>,
}

impl ViewerHandle {
    /// Wrap a controller and the provisioner that feeds it.
    pub fn new(controller: ViewerController, provisioner: LoaderProvisioner) -> Self {
        Self {
            controller: Rc::new(RefCell::new(controller)),
            provisioner: Rc::new(provisioner),
        }
    }

    /// Borrow the controller.
    pub fn borrow(&self) -> Ref<'_, ViewerController> {
        self.controller.borrow()
    }

    /// Mutably borrow the controller.
    pub fn borrow_mut(&self) -> RefMut<'_, ViewerController> {
        self.controller.borrow_mut()
    }

    /// The provisioner.
    pub fn provisioner(&self) -> &LoaderProvisioner {
        &self.provisioner
    }

    /// Resolve loaders (once) and install them into the controller.
    pub async fn ensure_loaders(&self) -> Readiness {
        self.install_loaders().await;
        self.provisioner.readiness()
    }

    /// Install the registry unless the controller already has one.
    /// Returns true when this call installed it.
    async fn install_loaders(&self) -> bool {
        if self.controller.borrow().has_loaders() {
            return false;
        }
        self.controller.borrow_mut().mark_loaders_pending();
        let registry = self.provisioner.ensure_loaders().await;
        let mut viewer = self.controller.borrow_mut();
        if viewer.has_loaders() {
            return false;
        }
        viewer.attach_loaders(registry);
        true
    }

    /// Ensure loaders, then begin, decode and finish a load.
    #[instrument(skip(self, buffer), fields(bytes = buffer.len()))]
    pub async fn load_asset(&self, buffer: Bytes, name: &str) -> Result<LoadOutcome, ViewerError> {
        let installed = self.install_loaders().await;
        let pending = {
            let mut viewer = self.controller.borrow_mut();
            // attaching an unusable registry already reported why loads are blocked
            if installed && *viewer.state() == LifecycleState::LoadersPending {
                if let Some(err) = viewer.last_error().cloned() {
                    return Err(err);
                }
            }
            viewer.begin_load(buffer, name)?
        };
        let decoded = pending.decode().await;
        self.controller.borrow_mut().finish_load(decoded)
    }
}
