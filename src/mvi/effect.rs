//! Base trait for one-shot effects in MVI architecture.

use std::fmt::Debug;

/// Marker trait for effect objects.
///
/// Effects are one-time occurrences (navigation, toasts) rather than state
/// facts. Each emission is cloned to every observer subscribed at that
/// moment and is never replayed to later subscribers.
pub trait Effect: Clone + Debug + Send + 'static {}
