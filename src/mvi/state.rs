//! Base trait for UI state in MVI architecture.

use std::fmt::Debug;

/// Marker trait for UI state objects.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Self-contained (all data needed to render the view)
/// - Comparable (PartialEq for detecting changes)
///
/// `Sync` is required because observers read the current state
/// concurrently with the processing loop.
pub trait UiState: Clone + PartialEq + Debug + Send + Sync + 'static {}
