//! Counter screen: the smallest useful screen, also used by the CLI demo.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::mvi::{Effect, Intent, Scope, Screen, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterIntent {
    Increment,
    Decrement,
    /// Add a signed amount. Overflow fails the intent and keeps the count.
    Add(i64),
    Reset,
}

impl Intent for CounterIntent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
}

impl UiState for CounterState {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEffect {
    /// The counter went back to zero from `from`.
    WasReset { from: i64 },
}

impl Effect for CounterEffect {}

#[derive(Debug, Default, Clone, Copy)]
pub struct CounterScreen;

#[async_trait]
impl Screen for CounterScreen {
    const NAME: &'static str = "counter";

    type Intent = CounterIntent;
    type State = CounterState;
    type Effect = CounterEffect;

    fn initial_state(&self) -> CounterState {
        CounterState::default()
    }

    async fn on_intent(
        &self,
        intent: CounterIntent,
        scope: Scope<CounterState, CounterEffect>,
    ) -> anyhow::Result<()> {
        let delta = match intent {
            CounterIntent::Increment => 1,
            CounterIntent::Decrement => -1,
            CounterIntent::Add(amount) => amount,
            CounterIntent::Reset => {
                let from = scope.state().count;
                scope.set_state(|_| CounterState::default());
                scope.emit_effect(CounterEffect::WasReset { from });
                return Ok(());
            }
        };
        let count = scope
            .state()
            .count
            .checked_add(delta)
            .with_context(|| format!("counter overflow adding {delta}"))?;
        scope.set_state(|_| CounterState { count });
        Ok(())
    }
}
