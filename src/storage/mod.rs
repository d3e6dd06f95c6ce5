//! Local preference storage.
//!
//! A small typed key-value store (string, int, bool, float, long) that can
//! be observed per key, plus a [`StateSlot`](crate::mvi::StateSlot) adapter
//! so containers can persist their state in it.

mod slot;
mod store;
mod value;

pub use slot::PreferenceSlot;
pub use store::{PreferenceStore, PreferenceStream, StorageError};
pub use value::{PrefType, PrefValue};
