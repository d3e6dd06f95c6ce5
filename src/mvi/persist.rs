//! Persisted-state slot a container restores from and writes back to.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// Well-known key under which a screen's state is stored.
pub const STATE_KEY: &str = "mvi_state_key";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reading or writing a [`StateSlot`].
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to restore persisted state: {source}")]
    Read {
        #[source]
        source: BoxError,
    },

    #[error("failed to persist state: {source}")]
    Write {
        #[source]
        source: BoxError,
    },
}

impl PersistError {
    pub fn read(source: impl Into<BoxError>) -> Self {
        Self::Read {
            source: source.into(),
        }
    }

    pub fn write(source: impl Into<BoxError>) -> Self {
        Self::Write {
            source: source.into(),
        }
    }
}

/// A single persisted value, scoped to one screen.
///
/// The container calls `get` once at construction and `set` after every
/// committed transition. Implementations decide the storage technology.
pub trait StateSlot<S>: Send + Sync {
    fn get(&self) -> Result<Option<S>, PersistError>;

    fn set(&self, state: &S) -> Result<(), PersistError>;
}

/// Shared in-memory slot.
///
/// Clones point at the same value, so a slot can outlive one container and
/// seed the next one created for the same screen.
pub struct MemorySlot<S> {
    value: Arc<Mutex<Option<S>>>,
}

impl<S> MemorySlot<S> {
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_value(state: S) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(state))),
        }
    }
}

impl<S: Clone> MemorySlot<S> {
    /// The last stored value.
    pub fn stored(&self) -> Option<S> {
        self.value.lock().clone()
    }
}

impl<S> Clone for MemorySlot<S> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<S> Default for MemorySlot<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send> StateSlot<S> for MemorySlot<S> {
    fn get(&self) -> Result<Option<S>, PersistError> {
        Ok(self.value.lock().clone())
    }

    fn set(&self, state: &S) -> Result<(), PersistError> {
        *self.value.lock() = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_slot_clones_share_value() {
        let slot = MemorySlot::<i32>::new();
        let other = slot.clone();
        assert_eq!(slot.get().unwrap(), None);

        other.set(&3).unwrap();
        assert_eq!(slot.get().unwrap(), Some(3));
        assert_eq!(slot.stored(), Some(3));
    }

    #[test]
    fn persist_error_wraps_source() {
        let err = PersistError::write(std::io::Error::other("read-only"));
        assert_eq!(err.to_string(), "failed to persist state: read-only");
        assert!(std::error::Error::source(&err).is_some());
    }
}
