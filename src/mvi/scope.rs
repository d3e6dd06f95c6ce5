//! Handle a screen uses to mutate state and emit effects during one intent.

use std::sync::Arc;

use super::container::Shared;
use super::effect::Effect;
use super::state::UiState;

/// Write access to a container for the duration of one intent.
///
/// A scope is bound to the turn it was created for. Once the handler's
/// future completes, `set_state` through this scope is ignored, which keeps
/// the processing loop the only writer. Effects may still be emitted until
/// the container is torn down.
pub struct Scope<S, E> {
    shared: Arc<Shared<S, E>>,
    turn: u64,
    intent: Arc<str>,
}

impl<S: UiState, E: Effect> Scope<S, E> {
    pub(crate) fn new(shared: Arc<Shared<S, E>>, turn: u64, intent: Arc<str>) -> Self {
        Self {
            shared,
            turn,
            intent,
        }
    }

    /// Current state of the container.
    pub fn state(&self) -> S {
        self.shared.current()
    }

    /// Replace the state with `reducer(&current)` and publish it.
    ///
    /// The reducer runs under the state lock, so concurrent writers within
    /// one turn never lose an update. It must not call back into the scope
    /// or the container. Persistence failures go to the fault sink.
    pub fn set_state(&self, reducer: impl FnOnce(&S) -> S) {
        if !self.shared.commit_in_turn(self.turn, reducer, &self.intent) {
            tracing::warn!(
                screen = self.shared.screen(),
                intent = %self.intent,
                "set_state outside of its intent turn ignored"
            );
        }
    }

    /// Deliver `effect` to the effect observers subscribed right now.
    pub fn emit_effect(&self, effect: E) {
        if self.shared.is_torn_down() {
            tracing::trace!(screen = self.shared.screen(), "effect after teardown dropped");
            return;
        }
        let delivered = self.shared.emit(effect);
        if delivered == 0 {
            tracing::trace!(
                screen = self.shared.screen(),
                intent = %self.intent,
                "effect dropped: no observers"
            );
        }
    }

    /// True once the container was torn down; long-running handlers can
    /// poll this between steps.
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_torn_down()
    }
}
