//! Session storage adapters.

use insights_diag_ports::SessionStoragePort;
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session storage held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemorySessionStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStoragePort for InMemorySessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Session storage persisted as a JSON object of string values.
///
/// A missing file reads as an empty session. Through the port a corrupt file
/// also reads as empty, and the next `set` replaces it; only [`load`] reports
/// `storage:corrupt`. Writes go to a sibling temp file that is renamed over
/// the target, so a crash never leaves a torn file.
///
/// [`load`]: FileSessionStorage::load
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileSessionStorage {
    /// Store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry, failing with `storage:corrupt` on unparsable content.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        let _guard = self.lock();
        self.read_entries()
    }

    /// Delete the backing file, ending the session.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.write_error(&error)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::storage_unavailable(),
                    format!("failed to read session storage: {error}"),
                )
                .with_metadata("path", self.path.display().to_string()));
            },
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::storage_corrupt(),
                format!("session storage is not a JSON object of strings: {error}"),
            )
            .with_metadata("path", self.path.display().to_string())
        })
    }

    fn read_entries_or_reset(&self) -> Result<BTreeMap<String, String>> {
        match self.read_entries() {
            Err(error) if error.has_code(&ErrorCode::storage_corrupt()) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %error,
                    "corrupt session storage read as empty"
                );
                Ok(BTreeMap::new())
            },
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| self.write_error(&error))?;
        }

        let temp_path = self.path.with_extension("tmp");
        let write = || -> io::Result<()> {
            let mut writer = BufWriter::new(fs::File::create(&temp_path)?);
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            fs::rename(&temp_path, &self.path)
        };
        write().map_err(|error| self.write_error(&error))
    }

    fn write_error(&self, error: &io::Error) -> ErrorEnvelope {
        ErrorEnvelope::expected(
            ErrorCode::storage_write_failed(),
            format!("failed to write session storage: {error}"),
        )
        .with_metadata("path", self.path.display().to_string())
    }
}

impl SessionStoragePort for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock();
        Ok(self.read_entries_or_reset()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock();
        let mut entries = self.read_entries_or_reset()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }
}
