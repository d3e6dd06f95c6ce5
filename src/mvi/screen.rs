//! Per-screen logic hosted by a state container.

use async_trait::async_trait;

use super::effect::Effect;
use super::intent::Intent;
use super::scope::Scope;
use super::state::UiState;

/// The two behaviors a screen supplies to its container.
///
/// `on_intent` is the only place where state transitions happen. It may
/// await I/O; the container does not start the next intent until the
/// returned future completes. Returning an error (or panicking) rolls the
/// state back to its value from before this intent and reports the fault.
#[async_trait]
pub trait Screen: Send + Sync + 'static {
    /// Stable identity, used as the persistence key prefix and in logs.
    const NAME: &'static str;

    type Intent: Intent;
    type State: UiState;
    type Effect: Effect;

    /// Initial state when nothing was seeded or restored.
    fn initial_state(&self) -> Self::State;

    async fn on_intent(
        &self,
        intent: Self::Intent,
        scope: Scope<Self::State, Self::Effect>,
    ) -> anyhow::Result<()>;
}
