// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed JSON documents on top of a raw blob store.
//!
//! Stores only move bytes; [`ConfigService`] owns the encoding and key rules
//! so every backend agrees on what a key may look like.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Raw blob storage addressed by a validated key.
pub trait ConfigStore {
    /// Read the blob for `key`; `Ok(None)` when nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replace the blob for `key`.
    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures while reading or writing config documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Keys are single path-safe segments: ASCII alphanumerics, `_` and `-`.
    #[error("invalid config key {0:?}")]
    InvalidKey(String),
    /// The platform config location could not be determined.
    #[error("config location unavailable: {0}")]
    Location(String),
    /// Underlying storage failed.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document is not valid JSON for the requested type.
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check that `key` is usable by every store (including as a file stem).
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_owned()))
    }
}

/// JSON documents keyed by name, persisted through a [`ConfigStore`].
#[derive(Debug, Clone, Default)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wrap `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decode the document under `key`. Missing and empty blobs are `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        validate_key(key)?;
        match self.store.read(key)? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(serde_json::from_slice(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Encode `value` as pretty JSON and store it under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        validate_key(key)?;
        let data = serde_json::to_vec_pretty(value)?;
        self.store.write(key, &data)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub(crate) struct MemStore {
        pub(crate) blobs: RefCell<BTreeMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemStore {
        fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
            Ok(self.blobs.borrow().get(key).cloned())
        }

        fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn absent_and_empty_documents_are_none() {
        let svc = ConfigService::new(MemStore::default());
        assert!(svc.load::<u32>("absent").expect("load").is_none());
        svc.store().blobs.borrow_mut().insert("blank".into(), Vec::new());
        assert!(svc.load::<u32>("blank").expect("load").is_none());
    }

    #[test]
    fn corrupt_document_is_a_json_error() {
        let svc = ConfigService::new(MemStore::default());
        svc.store()
            .blobs
            .borrow_mut()
            .insert("k".into(), b"{not json".to_vec());
        assert!(matches!(svc.load::<u32>("k"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn keys_must_be_single_safe_segments() {
        let svc = ConfigService::new(MemStore::default());
        for bad in ["", "../prefs", "a/b", "with space"] {
            assert!(matches!(
                svc.save(bad, &1_u32),
                Err(ConfigError::InvalidKey(_))
            ));
        }
        svc.save("viewer_prefs-2", &7_u32).expect("save");
        assert_eq!(svc.load::<u32>("viewer_prefs-2").expect("load"), Some(7));
    }
}
