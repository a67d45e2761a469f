//! Durable session medium backed by `redb`.

use std::path::Path;

use partyline_core::{error::StorageError, storage::SessionMedium};
use redb::{Database, TableDefinition};

const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

fn medium_error(error: impl std::fmt::Display) -> StorageError {
    StorageError::Medium(error.to_string())
}

/// Single-file key-value medium for the session record.
///
/// The policy layer (`partyline_core::storage::SessionStore`) decides what
/// to do when this medium fails; this type only reports the failures.
pub struct RedbMedium {
    db: Database,
}

impl RedbMedium {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(medium_error)?;
        Ok(Self { db })
    }
}

impl SessionMedium for RedbMedium {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let tx = self.db.begin_read().map_err(medium_error)?;
        let table = match tx.open_table(SESSIONS) {
            Ok(table) => table,
            // Nothing was ever written: an absent table is an absent record.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(error) => return Err(medium_error(error)),
        };
        let value = table.get(key).map_err(medium_error)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let tx = self.db.begin_write().map_err(medium_error)?;
        {
            let mut table = tx.open_table(SESSIONS).map_err(medium_error)?;
            table.insert(key, value).map_err(medium_error)?;
        }
        tx.commit().map_err(medium_error)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let tx = self.db.begin_write().map_err(medium_error)?;
        {
            let mut table = tx.open_table(SESSIONS).map_err(medium_error)?;
            table.remove(key).map_err(medium_error)?;
        }
        tx.commit().map_err(medium_error)
    }
}

#[cfg(test)]
mod tests {
    use partyline_core::{session::Session, storage::SessionStore};

    use super::*;

    fn session() -> Session {
        Session {
            room_id: "room-1".to_string(),
            nickname: "ada".to_string(),
            user_icon: Some("owl".to_string()),
        }
    }

    #[test]
    fn round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partyline.redb");

        let store = SessionStore::new(RedbMedium::open(&path).unwrap());
        assert_eq!(store.load(), None);

        assert!(store.save(&session()));
        assert_eq!(store.load(), Some(session()));

        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn records_survive_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partyline.redb");

        {
            let store = SessionStore::new(RedbMedium::open(&path).unwrap());
            assert!(store.save(&session()));
        }

        // A fresh handle on the same file models a process restart.
        let store = SessionStore::new(RedbMedium::open(&path).unwrap());
        assert_eq!(store.load(), Some(session()));
    }

    #[test]
    fn raw_medium_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let medium = RedbMedium::open(dir.path().join("raw.redb")).unwrap();

        assert_eq!(medium.get("k").unwrap(), None);
        medium.put("k", b"value").unwrap();
        assert_eq!(medium.get("k").unwrap().as_deref(), Some(b"value".as_slice()));

        medium.delete("k").unwrap();
        assert_eq!(medium.get("k").unwrap(), None);

        // Deleting an absent key is not an error.
        medium.delete("k").unwrap();
    }
}
