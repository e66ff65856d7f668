// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config port shared across Vista tools (CLI, desktop host).

use tracing::warn;

use crate::config::{ConfigService, ConfigStore};
use crate::prefs::ViewerPrefs;

/// Store key for viewer preferences.
pub const PREFS_KEY: &str = "viewer_prefs";

/// Config-facing port for loading/saving viewer preferences.
pub trait ConfigPort {
    /// Load viewer preferences (returns None if missing or unreadable).
    fn load_prefs(&self) -> Option<ViewerPrefs>;
    /// Persist viewer preferences (best-effort; errors are logged).
    fn save_prefs(&self, prefs: &ViewerPrefs);
}

impl<S: ConfigStore> ConfigPort for ConfigService<S> {
    fn load_prefs(&self) -> Option<ViewerPrefs> {
        match self.load(PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(?err, "failed to load viewer prefs; using defaults");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &ViewerPrefs) {
        if let Err(err) = self.save(PREFS_KEY, prefs) {
            warn!(?err, "failed to save viewer prefs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::MemStore;

    #[test]
    fn prefs_roundtrip_through_service() {
        let svc = ConfigService::new(MemStore::default());
        assert!(svc.load_prefs().is_none());

        let mut prefs = ViewerPrefs::default();
        prefs.movement.step = 1.5;
        svc.save_prefs(&prefs);
        assert_eq!(svc.load_prefs(), Some(prefs));
    }

    #[test]
    fn unreadable_prefs_fall_back_to_none() {
        let store = MemStore::default();
        store
            .blobs
            .borrow_mut()
            .insert(PREFS_KEY.into(), b"42".to_vec());
        let svc = ConfigService::new(store);
        assert!(svc.load_prefs().is_none());
    }
}
