//! Scripted session storage double.
//!
//! Backed by a plain map, with switches to make reads or writes fail or to
//! report the backend as unavailable.

use insights_diag_ports::SessionStoragePort;
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session storage double with injectable failures.
#[derive(Debug)]
pub struct ScriptedSessionStorage {
    values: Mutex<BTreeMap<String, String>>,
    available: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl Default for ScriptedSessionStorage {
    fn default() -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }
}

impl ScriptedSessionStorage {
    /// Healthy, empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that reports itself unavailable.
    pub fn unavailable() -> Self {
        let storage = Self::default();
        storage.set_available(false);
        storage
    }

    /// Storage pre-seeded with `key = value`.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.values().insert(key.to_string(), value.to_string());
        storage
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toggle availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing failure switches.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    /// Overwrite a raw value, bypassing failure switches.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.values().insert(key.to_string(), value.to_string());
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SessionStoragePort for ScriptedSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::storage_unavailable(),
                "session storage read failed",
            )
            .with_metadata("key", key));
        }
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::storage_write_failed(),
                "session storage quota exceeded",
            )
            .with_metadata("key", key));
        }
        self.values().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
