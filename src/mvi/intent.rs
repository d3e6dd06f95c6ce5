//! Base trait for intents (user/system actions) in MVI architecture.

use std::fmt::Debug;

/// Marker trait for intent objects.
///
/// Intents represent:
/// - User actions (button presses, form submissions)
/// - System events (repository results, timers)
/// - Navigation requests
///
/// Intents are queued by a [`StateContainer`](super::StateContainer) and
/// handed to the screen one at a time, in submission order.
/// `Debug` is required so a failing intent can be named in fault reports.
pub trait Intent: Debug + Send + 'static {}
