use std::{collections::HashMap, fs, io::{ErrorKind, Write}, path::{Path, PathBuf}, sync::{Arc, OnceLock}};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Bump when the layout of any cached payload changes
pub const SCHEMA_VERSION: u32 = 1;

pub const KIND_AGGREGATE: &str = "aggregate";
pub const KIND_MODEL: &str = "model";

/// Versioned wrapper around every cache payload
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    pub schema_version: u32,
    pub kind: String,
    pub payload: T,
}

/// Write `payload` to `path` atomically (temp file in the same directory, then rename)
pub fn write_entry<T: Serialize>(path: &Path, kind: &str, payload: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| Error::CacheIo { path: dir.to_path_buf(), source })?;

    let envelope = CacheEnvelope {
        schema_version: SCHEMA_VERSION,
        kind: kind.to_string(),
        payload,
    };
    let bytes = serde_cbor::to_vec(&envelope).map_err(Error::CacheEncode)?;

    let io_err = |source| Error::CacheIo { path: path.to_path_buf(), source };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Read an entry
///
/// # Returns
/// * `Ok(None)` - no entry at `path`
/// * `Ok(Some(_))` - entry decoded with the expected version and kind
/// * `Err(_)` - entry exists but is unreadable, corrupt, stale or of another kind
pub fn read_entry<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(Error::CacheIo { path: path.to_path_buf(), source }),
    };
    // ヘッダだけ先に読んで版を確認する
    #[derive(Deserialize)]
    struct Header {
        schema_version: u32,
        kind: String,
    }
    let header: Header = serde_cbor::from_slice(&bytes).map_err(Error::CacheDecode)?;
    if header.schema_version != SCHEMA_VERSION {
        return Err(Error::CacheVersion { found: header.schema_version, expected: SCHEMA_VERSION });
    }
    if header.kind != kind {
        return Err(Error::CacheKind { found: header.kind, expected: kind.to_string() });
    }
    let envelope: CacheEnvelope<T> = serde_cbor::from_slice(&bytes).map_err(Error::CacheDecode)?;
    Ok(Some(envelope.payload))
}

/// Remove an entry, absent is fine
pub fn remove_entry(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::CacheIo { path: path.to_path_buf(), source }),
    }
}

/// One mutex per cache path
/// Serializes the check -> build -> write sequence of concurrent misses on the same key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by every store
    /// Two stores over the same `cache_dir` get the same lock for the same entry.
    pub fn shared() -> &'static KeyedLocks {
        static SHARED: OnceLock<KeyedLocks> = OnceLock::new();
        SHARED.get_or_init(KeyedLocks::new)
    }

    /// Get the lock for `key`, creating it on first use
    /// Relative keys are resolved against the working directory first.
    pub fn lock_for(&self, key: &Path) -> Arc<Mutex<()>> {
        let key = std::path::absolute(key).unwrap_or_else(|_| key.to_path_buf());
        let mut map = self.locks.lock();
        Arc::clone(map.entry(key).or_default())
    }
}
