//! Container state persisted in the preference store.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::mvi::{PersistError, Screen, StateSlot, STATE_KEY};

use super::store::PreferenceStore;

/// [`StateSlot`] that stores a screen's state as JSON under
/// `"<owner>.mvi_state_key"`.
pub struct PreferenceSlot<S> {
    store: PreferenceStore,
    key: String,
    _state: PhantomData<fn() -> S>,
}

impl<S> PreferenceSlot<S> {
    pub fn new(store: PreferenceStore, owner: &str) -> Self {
        Self {
            store,
            key: format!("{owner}.{STATE_KEY}"),
            _state: PhantomData,
        }
    }

    /// Slot keyed by the screen's `NAME`.
    pub fn for_screen<Sc>(store: PreferenceStore) -> Self
    where
        Sc: Screen<State = S>,
    {
        Self::new(store, Sc::NAME)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S> StateSlot<S> for PreferenceSlot<S>
where
    S: Serialize + DeserializeOwned,
{
    fn get(&self) -> Result<Option<S>, PersistError> {
        let Some(raw) = self.store.try_get::<String>(&self.key) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(PersistError::read)
    }

    fn set(&self, state: &S) -> Result<(), PersistError> {
        let raw = serde_json::to_string(state).map_err(PersistError::write)?;
        self.store.save(&self.key, raw).map_err(PersistError::write)
    }
}
