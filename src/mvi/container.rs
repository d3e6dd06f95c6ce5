//! The state container: one state, one intent queue, two observer registries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::effect::Effect;
use super::fault::{panic_message, ContainerFault, FaultContext, FaultSink, TracingFaultSink};
use super::intent::Intent;
use super::lifecycle::{Lifecycle, PendingIntents};
use super::observers::{Observers, Subscription};
use super::persist::{PersistError, StateSlot};
use super::scope::Scope;
use super::screen::Screen;
use super::state::UiState;

/// Container type hosting a given screen.
pub type ScreenContainer<Sc> =
    StateContainer<<Sc as Screen>::Intent, <Sc as Screen>::State, <Sc as Screen>::Effect>;

/// State shared by the container handle, the processing loop, and scopes.
pub(crate) struct Shared<S, E> {
    screen: &'static str,
    state: RwLock<S>,
    states: Observers<S>,
    effects: Observers<E>,
    slot: Option<Arc<dyn StateSlot<S>>>,
    faults: Arc<dyn FaultSink>,
    next_turn: AtomicU64,
    active_turn: AtomicU64,
    lifecycle: Lifecycle,
}

impl<S, E> Shared<S, E> {
    /// Flip the teardown flag and detach observers. `false` if already done.
    fn close(&self) -> bool {
        if !self.lifecycle.tear_down() {
            return false;
        }
        self.states.close();
        self.effects.close();
        true
    }
}

impl<S: UiState, E: Effect> Shared<S, E> {
    pub(crate) fn screen(&self) -> &'static str {
        self.screen
    }

    pub(crate) fn current(&self) -> S {
        self.state.read().clone()
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.lifecycle.is_torn_down()
    }

    fn is_turn_active(&self, turn: u64) -> bool {
        !self.is_torn_down() && self.active_turn.load(Ordering::SeqCst) == turn
    }

    fn begin_turn(&self) -> u64 {
        let turn = self.next_turn.fetch_add(1, Ordering::SeqCst) + 1;
        self.active_turn.store(turn, Ordering::SeqCst);
        turn
    }

    fn end_turn(&self) {
        // Taken under the write lock so no scope can pass the turn check
        // and commit once the turn is over.
        let _guard = self.state.write();
        self.active_turn.store(0, Ordering::SeqCst);
    }

    fn observe_state(&self) -> Subscription<S> {
        // Holding the read lock while registering means no commit can land
        // between the snapshot and the subscription.
        let guard = self.state.read();
        self.states.subscribe_with(guard.clone())
    }

    /// Apply `reducer` to the current state and publish the result, if
    /// `turn` still owns the state. Returns `false` when the write is refused.
    ///
    /// The turn check, the reducer, and the replacement all happen under the
    /// write lock.
    pub(crate) fn commit_in_turn(
        &self,
        turn: u64,
        reducer: impl FnOnce(&S) -> S,
        intent: &str,
    ) -> bool {
        let persisted = {
            let mut guard = self.state.write();
            if !self.is_turn_active(turn) {
                return false;
            }
            let next = reducer(&*guard);
            self.replace(&mut *guard, next)
        };
        if let Err(err) = persisted {
            self.report(ContainerFault::Persistence(err), Some(intent));
        }
        true
    }

    /// Put `before` back if the failed turn left a different state.
    fn restore(&self, before: S, intent: &str) {
        let persisted = {
            let mut guard = self.state.write();
            if *guard == before {
                return;
            }
            self.replace(&mut *guard, before)
        };
        if let Err(err) = persisted {
            self.report(ContainerFault::Persistence(err), Some(intent));
        }
    }

    /// Swap in `next`, broadcast it, and write it to the slot. The caller
    /// holds the write lock, so broadcasts and slot writes follow commit order.
    fn replace(&self, current: &mut S, next: S) -> Result<(), PersistError> {
        *current = next.clone();
        let observers = self.states.broadcast(next.clone());
        tracing::trace!(screen = self.screen, observers, "state committed");
        match &self.slot {
            Some(slot) => slot.set(&next),
            None => Ok(()),
        }
    }

    pub(crate) fn emit(&self, effect: E) -> usize {
        self.effects.broadcast(effect)
    }

    fn report(&self, fault: ContainerFault, intent: Option<&str>) {
        let context = FaultContext {
            screen: self.screen,
            intent: intent.map(str::to_owned),
        };
        self.faults.report(&fault, &context);
    }
}

/// Configures and spawns a [`StateContainer`].
pub struct ContainerBuilder<Sc: Screen> {
    screen: Sc,
    seed: Option<Sc::State>,
    slot: Option<Arc<dyn StateSlot<Sc::State>>>,
    faults: Arc<dyn FaultSink>,
}

impl<Sc: Screen> ContainerBuilder<Sc> {
    pub fn new(screen: Sc) -> Self {
        Self {
            screen,
            seed: None,
            slot: None,
            faults: Arc::new(TracingFaultSink),
        }
    }

    /// Start from `state` instead of `Screen::initial_state`.
    pub fn seed(mut self, state: Sc::State) -> Self {
        self.seed = Some(state);
        self
    }

    /// Restore from and write back to `slot`. A stored value beats the seed.
    pub fn persist<P>(mut self, slot: P) -> Self
    where
        P: StateSlot<Sc::State> + 'static,
    {
        self.slot = Some(Arc::new(slot));
        self
    }

    pub fn fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.faults = sink;
        self
    }

    /// Resolve the initial state and start the processing loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> ScreenContainer<Sc> {
        let Self {
            screen,
            seed,
            slot,
            faults,
        } = self;

        let restored = slot.as_ref().and_then(|slot| match slot.get() {
            Ok(state) => state,
            Err(err) => {
                let context = FaultContext {
                    screen: Sc::NAME,
                    intent: None,
                };
                faults.report(&ContainerFault::Persistence(err), &context);
                None
            }
        });
        let initial = match restored {
            Some(state) => {
                tracing::debug!(screen = Sc::NAME, "restored persisted state");
                state
            }
            None => seed.unwrap_or_else(|| screen.initial_state()),
        };

        let shared = Arc::new(Shared {
            screen: Sc::NAME,
            state: RwLock::new(initial),
            states: Observers::new(),
            effects: Observers::new(),
            slot,
            faults,
            next_turn: AtomicU64::new(0),
            active_turn: AtomicU64::new(0),
            lifecycle: Lifecycle::new(),
        });
        let pending = PendingIntents::new();
        let (intents, receiver) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(run_loop(
            Arc::new(screen),
            Arc::clone(&shared),
            receiver,
            pending.clone(),
        ));
        tracing::debug!(screen = Sc::NAME, "container started");

        StateContainer {
            shared,
            intents,
            pending,
        }
    }
}

/// Single source of truth for one screen.
///
/// Intents are processed one at a time in submission order; state is
/// broadcast with latest-value replay; effects are broadcast without replay.
/// Dropping the container tears it down.
pub struct StateContainer<I, S, E> {
    shared: Arc<Shared<S, E>>,
    intents: UnboundedSender<I>,
    pending: PendingIntents,
}

impl<I: Intent, S: UiState, E: Effect> StateContainer<I, S, E> {
    pub fn builder<Sc>(screen: Sc) -> ContainerBuilder<Sc>
    where
        Sc: Screen<Intent = I, State = S, Effect = E>,
    {
        ContainerBuilder::new(screen)
    }

    /// Queue `intent` for processing. Never blocks; a no-op after teardown.
    pub fn submit(&self, intent: I) {
        if self.shared.is_torn_down() {
            tracing::trace!(screen = self.shared.screen, "submit after teardown ignored");
            return;
        }
        self.pending.increment();
        if self.intents.send(intent).is_err() {
            self.pending.decrement();
        }
    }

    /// Current state, then every committed state in commit order.
    pub fn observe_state(&self) -> Subscription<S> {
        self.shared.observe_state()
    }

    /// Effects emitted from now on.
    pub fn observe_effects(&self) -> Subscription<E> {
        self.shared.effects.subscribe()
    }

    pub fn current_state(&self) -> S {
        self.shared.current()
    }

    /// Resolve once every intent submitted so far has been processed, or the
    /// container has been torn down.
    pub async fn drain(&self) {
        self.pending.wait_idle(&self.shared.lifecycle).await;
    }
}

impl<I, S, E> StateContainer<I, S, E> {
    /// Stop processing, cancel the in-flight handler, and detach observers.
    /// Idempotent.
    pub fn tear_down(&self) {
        if !self.shared.close() {
            return;
        }
        self.pending.release_waiters();
        tracing::debug!(screen = self.shared.screen, "container torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.lifecycle.is_torn_down()
    }
}

impl<I, S, E> Drop for StateContainer<I, S, E> {
    fn drop(&mut self) {
        self.tear_down();
    }
}

async fn run_loop<Sc: Screen>(
    screen: Arc<Sc>,
    shared: Arc<Shared<Sc::State, Sc::Effect>>,
    mut intents: UnboundedReceiver<Sc::Intent>,
    pending: PendingIntents,
) {
    let lifecycle = shared.lifecycle.clone();
    loop {
        let intent = tokio::select! {
            biased;
            _ = lifecycle.wait() => break,
            next = intents.recv() => match next {
                Some(intent) => intent,
                None => break,
            },
        };

        let label: Arc<str> = Arc::from(format!("{intent:?}"));
        tracing::trace!(screen = Sc::NAME, intent = %label, "processing intent");
        let before = shared.current();
        let turn = shared.begin_turn();
        let scope = Scope::new(Arc::clone(&shared), turn, Arc::clone(&label));
        let handler = Arc::clone(&screen);
        let mut task = tokio::spawn(async move { handler.on_intent(intent, scope).await });

        let joined = tokio::select! {
            biased;
            _ = lifecycle.wait() => {
                task.abort();
                break;
            }
            joined = &mut task => joined,
        };
        shared.end_turn();

        let fault = match joined {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(ContainerFault::Handler(err)),
            // The task is only aborted on teardown, which leaves the loop
            // above, so a join error here is a panic.
            Err(err) => Some(ContainerFault::Panicked {
                message: err
                    .try_into_panic()
                    .map(panic_message)
                    .unwrap_or_else(|err| err.to_string()),
            }),
        };
        if let Some(fault) = fault {
            shared.restore(before, &label);
            shared.report(fault, Some(&*label));
        }
        pending.decrement();
    }
    tracing::debug!(screen = Sc::NAME, "intent loop stopped");
}
