//! Durable session persistence.
//!
//! Split in two layers so policy and medium stay independently testable:
//!
//! - [`SessionMedium`]: a raw durable key-value surface (bytes under a
//!   string key). Implementations may fail; they report [`StorageError`].
//! - [`SessionStore`]: the policy layer. One fixed key, CBOR-encoded
//!   [`Session`] record, and deliberate failure recovery: reads fail soft
//!   to an absent record, and a failed write clears the key so a torn value
//!   can never break the next load. Storage trouble never reaches the UI.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{error::StorageError, session::Session};

/// Storage key under which the single session record lives.
const SESSION_KEY: &str = "currentRoom";

/// Raw durable key-value medium.
///
/// Only the fixed session key is ever used, but the medium keeps a general
/// keyed surface so one database can host other records alongside it.
pub trait SessionMedium: Send + Sync {
    /// Read the bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory medium.
///
/// Clones share the same cells, so a test can hand the "same storage" to a
/// second client instance to model a process restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    cells: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryMedium {
    /// Create an empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    fn cells(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        match self.cells.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SessionMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.cells().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.cells().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.cells().remove(key);
        Ok(())
    }
}

/// Policy layer over a [`SessionMedium`].
///
/// Holds exactly one session record under a fixed key. All failure handling
/// happens here; callers never see a [`StorageError`].
pub struct SessionStore {
    medium: Box<dyn SessionMedium>,
}

impl SessionStore {
    /// Wrap a medium.
    pub fn new(medium: impl SessionMedium + 'static) -> Self {
        Self { medium: Box::new(medium) }
    }

    /// Load the persisted session.
    ///
    /// Read failures and undecodable records fail soft to `None`.
    pub fn load(&self) -> Option<Session> {
        let bytes = self.medium.get(SESSION_KEY).ok().flatten()?;
        ciborium::de::from_reader(bytes.as_slice()).ok()
    }

    /// Persist the session, replacing any previous record.
    ///
    /// Returns whether the record was durably written. On failure the key is
    /// deleted so a half-written value cannot poison the next load, and the
    /// failure is otherwise swallowed.
    pub fn save(&self, session: &Session) -> bool {
        let mut buf = Vec::new();
        let written = ciborium::ser::into_writer(session, &mut buf).is_ok()
            && self.medium.put(SESSION_KEY, &buf).is_ok();
        if !written {
            let _ = self.medium.delete(SESSION_KEY);
        }
        written
    }

    /// Remove the persisted session, best effort.
    pub fn clear(&self) {
        let _ = self.medium.delete(SESSION_KEY);
    }
}
