//! Key-value preference store with optional TOML file backing.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;

use super::value::{PrefType, PrefValue};

type PrefMap = BTreeMap<String, PrefValue>;

/// Errors that can occur while loading or writing preferences.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to parse preferences file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Failed to write preferences file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    values: PrefMap,
}

/// Thread-safe preference store.
///
/// Clones share the same values. Edits are serialized; when the store is
/// file-backed the file is rewritten atomically before the in-memory map is
/// updated, so a failed write leaves both unchanged.
///
/// Edits of a file-backed store block the calling thread on file I/O and on
/// the cross-process lock. Inside a multi-threaded tokio runtime the write
/// runs through `block_in_place`; on a current-thread runtime it blocks the
/// runtime until done.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: Option<PathBuf>,
    values: watch::Sender<Arc<PrefMap>>,
    edit_lock: Mutex<()>,
}

impl PreferenceStore {
    /// A store that lives only as long as its handles.
    pub fn in_memory() -> Self {
        Self::with_values(None, PrefMap::new())
    }

    /// Open a file-backed store.
    ///
    /// A missing or unreadable file opens as an empty store; a file that
    /// exists but is not valid TOML is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str::<PreferenceFile>(&content)
                    .map_err(|source| StorageError::Parse {
                        path: path.clone(),
                        source,
                    })?
                    .values
            }
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), "Failed to read preferences, starting empty: {err}");
                }
                PrefMap::new()
            }
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "preferences loaded");
        Ok(Self::with_values(Some(path), values))
    }

    fn with_values(path: Option<PathBuf>, values: PrefMap) -> Self {
        let (values, _) = watch::channel(Arc::new(values));
        Self {
            inner: Arc::new(StoreInner {
                path,
                values,
                edit_lock: Mutex::new(()),
            }),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn save<T: PrefType>(&self, key: &str, value: T) -> Result<(), StorageError> {
        self.edit(|values| {
            values.insert(key.to_string(), value.into_pref());
        })
    }

    /// Stored value for `key`, or `default` if missing or of another type.
    pub fn get<T: PrefType>(&self, key: &str, default: T) -> T {
        self.try_get(key).unwrap_or(default)
    }

    pub fn try_get<T: PrefType>(&self, key: &str) -> Option<T> {
        self.inner.values.borrow().get(key).and_then(T::from_pref)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.edit(|values| values.remove(key).is_some())
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.edit(|values| values.clear())
    }

    /// Stream of the value under `key`: the current value first, then the
    /// latest value after each edit of the store.
    pub fn observe<T: PrefType>(&self, key: &str, default: T) -> PreferenceStream<T> {
        let mut receiver = self.inner.values.subscribe();
        receiver.mark_changed();
        PreferenceStream {
            key: key.to_string(),
            default,
            receiver,
        }
    }

    fn snapshot(&self) -> Arc<PrefMap> {
        Arc::clone(&self.inner.values.borrow())
    }

    fn edit<R>(&self, apply: impl FnOnce(&mut PrefMap) -> R) -> Result<R, StorageError> {
        let _guard = self.inner.edit_lock.lock();
        let mut next = self.snapshot().as_ref().clone();
        let result = apply(&mut next);
        if let Some(path) = &self.inner.path {
            blocking(|| write_file(path, &next))?;
        }
        self.inner.values.send_replace(Arc::new(next));
        Ok(result)
    }
}

/// Typed view of one key that follows store edits.
pub struct PreferenceStream<T> {
    key: String,
    default: T,
    receiver: watch::Receiver<Arc<PrefMap>>,
}

impl<T: PrefType> PreferenceStream<T> {
    /// Value as of now, without waiting.
    pub fn current(&self) -> T {
        lookup(&self.receiver.borrow(), &self.key, &self.default)
    }

    /// Next value. `None` once every store handle is dropped.
    ///
    /// Edits that land between two calls are coalesced into the latest one.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        let values = Arc::clone(&self.receiver.borrow_and_update());
        Some(lookup(&values, &self.key, &self.default))
    }
}

fn lookup<T: PrefType>(values: &PrefMap, key: &str, default: &T) -> T {
    values
        .get(key)
        .and_then(T::from_pref)
        .unwrap_or_else(|| default.clone())
}

fn write_file(path: &Path, values: &PrefMap) -> Result<(), StorageError> {
    let content = toml::to_string(&PreferenceFile {
        values: values.clone(),
    })?;
    let io_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    // Exclusive lock on a sidecar file so two processes never interleave
    // the temp write and the rename.
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path.with_extension("lock"))
        .map_err(io_err)?;
    lock.lock_exclusive().map_err(io_err)?;

    let tmp = path.with_extension("toml.tmp");
    let written = fs::write(&tmp, content).and_then(|_| fs::rename(&tmp, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    let _ = FileExt::unlock(&lock);
    written.map_err(io_err)
}

/// Run blocking file work without stalling other tasks on a worker thread.
fn blocking<R>(work: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}
