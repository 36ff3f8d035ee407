//! Persistent per-profile key-value storage.
//!
//! Session state (the bearer token, the cart snapshot) is stored as plain
//! textual key-value entries, one file per key under a profile directory.
//! There is no schema versioning on the entries.
//!
//! # Degraded mode
//!
//! Storage must never fail the user action that triggered a write. If the
//! durable backend errors (permissions, disk full, missing directory), the
//! store drops to memory-only operation for the remainder of the process
//! and logs a warning. Callers cannot observe the difference except through
//! [`SessionStore::is_degraded`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Keys for persisted session state.
pub mod keys {
    /// Key for the raw bearer token of the authenticated session.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Key for the serialized cart snapshot.
    pub const CART: &str = "cart";
}

/// Handle to the per-profile store.
///
/// Cheaply cloneable; clones share the same underlying storage, so the auth
/// and cart slices can each hold a handle.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
    disk: Option<DiskBackend>,
    /// In-memory mirror of every entry; becomes the only copy in degraded mode.
    cache: HashMap<String, String>,
    degraded: bool,
}

impl SessionStore {
    /// Open a store backed by one file per key under `dir`.
    ///
    /// If the directory cannot be created the store starts in degraded
    /// (memory-only) mode instead of failing.
    #[must_use]
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (disk, degraded) = match fs::create_dir_all(&dir) {
            Ok(()) => (Some(DiskBackend { dir }), false),
            Err(err) => {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %err,
                    "storage unavailable, continuing memory-only"
                );
                (None, true)
            }
        };

        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                disk,
                cache: HashMap::new(),
                degraded,
            })),
        }
    }

    /// Open a store with no durable backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                disk: None,
                cache: HashMap::new(),
                degraded: false,
            })),
        }
    }

    /// Read the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();

        if let Some(value) = inner.cache.get(key) {
            return Some(value.clone());
        }

        let read = inner.disk.as_ref().map(|disk| disk.read(key));
        match read {
            Some(Ok(Some(value))) => {
                inner.cache.insert(key.to_owned(), value.clone());
                Some(value)
            }
            Some(Ok(None)) | None => None,
            Some(Err(err)) => {
                inner.degrade(key, &err);
                None
            }
        }
    }

    /// Write `value` under `key`.
    ///
    /// The write is synchronous; when it returns, the entry is durable
    /// (or the store has degraded to memory-only).
    pub fn put(&self, key: &str, value: &str) {
        let mut inner = self.lock();
        inner.cache.insert(key.to_owned(), value.to_owned());

        if let Some(disk) = inner.disk.as_ref() {
            if let Err(err) = disk.write(key, value) {
                inner.degrade(key, &err);
            }
        }
    }

    /// Remove the entry under `key`. Removing an absent entry is a no-op.
    pub fn remove(&self, key: &str) {
        let mut inner = self.lock();
        inner.cache.remove(key);

        if let Some(disk) = inner.disk.as_ref() {
            if let Err(err) = disk.remove(key) {
                inner.degrade(key, &err);
            }
        }
    }

    /// Whether the store has fallen back to memory-only operation.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.lock().degraded
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // A poisoned lock means a panic mid-write; the cache is still the
        // authoritative in-memory copy, so keep going with it.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StoreInner {
    /// Drop the durable backend after an I/O failure.
    fn degrade(&mut self, key: &str, err: &io::Error) {
        tracing::warn!(
            key,
            error = %err,
            "storage failed, continuing memory-only"
        );
        self.disk = None;
        self.degraded = true;
    }
}

struct DiskBackend {
    dir: PathBuf,
}

impl DiskBackend {
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::write(self.path_for(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("disk", &inner.disk.as_ref().map(|d| d.dir.display().to_string()))
            .field("entries", &inner.cache.len())
            .field("degraded", &inner.degraded)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let store = SessionStore::in_memory();
        assert_eq!(store.get(keys::AUTH_TOKEN), None);

        store.put(keys::AUTH_TOKEN, "token-value");
        assert_eq!(store.get(keys::AUTH_TOKEN), Some("token-value".to_owned()));

        store.remove(keys::AUTH_TOKEN);
        assert_eq!(store.get(keys::AUTH_TOKEN), None);
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_disk_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = SessionStore::on_disk(dir.path());
        store.put(keys::CART, "[]");
        drop(store);

        let reopened = SessionStore::on_disk(dir.path());
        assert_eq!(reopened.get(keys::CART), Some("[]".to_owned()));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());

        store.remove(keys::CART);
        store.remove(keys::CART);
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_unusable_directory_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("profile");
        fs::write(&blocker, "not a directory").unwrap();

        // create_dir_all fails because a file occupies the path
        let store = SessionStore::on_disk(&blocker);
        assert!(store.is_degraded());

        // Operation still succeeds, memory-only
        store.put(keys::AUTH_TOKEN, "token-value");
        assert_eq!(store.get(keys::AUTH_TOKEN), Some("token-value".to_owned()));
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::in_memory();
        let clone = store.clone();

        store.put(keys::CART, "[1]");
        assert_eq!(clone.get(keys::CART), Some("[1]".to_owned()));
    }
}
