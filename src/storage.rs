//! Key/value substrates the record store runs on.
//!
//! A backend only has to hold opaque byte values under string keys, swap a
//! value atomically when it still matches what the caller read, and hand
//! out ids that are never reissued.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Returned by [`Storage::compare_and_swap`] when the stored value changed
/// since it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

pub trait Storage {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Unconditionally sets (`Some`) or deletes (`None`) a key.
    fn put(&self, key: &str, value: Option<Vec<u8>>) -> Result<(), Self::Error>;

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<Result<(), Conflict>, Self::Error>;

    fn generate_id(&self) -> Result<u64, Self::Error>;

    fn flush(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct SledStorage {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStorage {
    pub fn new<V: AsRef<[u8]>>(db: sled::Db, namespace: V) -> sled::Result<Self> {
        let tree = db.open_tree(namespace)?;
        Ok(SledStorage { db, tree })
    }
}

impl Storage for SledStorage {
    type Error = sled::Error;

    fn get(&self, key: &str) -> sled::Result<Option<Vec<u8>>> {
        Ok(self.tree.get(key)?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &str, value: Option<Vec<u8>>) -> sled::Result<()> {
        match value {
            Some(value) => self.tree.insert(key, value).map(|_| ()),
            None => self.tree.remove(key).map(|_| ()),
        }
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> sled::Result<Result<(), Conflict>> {
        Ok(self
            .tree
            .compare_and_swap(key, expected, new)?
            .map_err(|_| Conflict))
    }

    fn generate_id(&self) -> sled::Result<u64> {
        self.db.generate_id()
    }

    fn flush(&self) -> sled::Result<()> {
        self.tree.flush().map(|_| ())
    }
}

/// Process-local storage with no persistence.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Infallible> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: Option<Vec<u8>>) -> Result<(), Infallible> {
        let mut entries = self.entries();
        match value {
            Some(value) => entries.insert(key.to_owned(), value),
            None => entries.remove(key),
        };
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<Result<(), Conflict>, Infallible> {
        let mut entries = self.entries();
        if entries.get(key).map(Vec::as_slice) != expected {
            return Ok(Err(Conflict));
        }
        match new {
            Some(value) => entries.insert(key.to_owned(), value),
            None => entries.remove(key),
        };
        Ok(Ok(()))
    }

    fn generate_id(&self) -> Result<u64, Infallible> {
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}
