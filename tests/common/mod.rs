//! Shared test screens, sinks, slots and helpers.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use espert::mvi::{
    ContainerFault, Effect, FaultContext, FaultSink, Intent, PersistError, Scope, Screen,
    StateSlot, Subscription, UiState,
};

pub const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabIntent {
    /// Append the value.
    Push(u32),
    /// Sleep, then append.
    PushSlow(u32, u64),
    /// Append, then fail.
    FailAfterPush(u32),
    /// Append, then panic.
    PanicAfterPush(u32),
    /// Emit a note effect.
    Emit(String),
    /// Append the value, then never complete.
    Hang(u32),
    /// Hand the scope to a background task that writes after the turn ends.
    SpawnLateWrite(u32),
    /// Hand the scope to an OS thread whose reducer is still running when
    /// the handler returns.
    SlowThreadWrite(u32),
    /// Append `0..n` from `n` OS threads sharing the scope, all in one turn.
    ParallelPush(u32),
}

impl Intent for LabIntent {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabState {
    pub items: Vec<u32>,
}

impl UiState for LabState {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabEffect {
    Note(String),
}

impl Effect for LabEffect {}

/// Sets a flag when dropped; used to observe handler cancellation.
pub struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Screen with scripted behaviors and probes for ordering and concurrency.
#[derive(Clone, Default)]
pub struct LabScreen {
    pub seen: Arc<Mutex<Vec<LabIntent>>>,
    pub factory_calls: Arc<AtomicUsize>,
    pub active: Arc<AtomicUsize>,
    pub max_active: Arc<AtomicUsize>,
    pub hang_dropped: Arc<AtomicBool>,
    pub late_write_done: Arc<AtomicBool>,
}

impl LabScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<LabIntent> {
        self.seen.lock().clone()
    }

    pub fn factory_calls(&self) -> usize {
        self.factory_calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

fn push(scope: &Scope<LabState, LabEffect>, value: u32) {
    scope.set_state(|state| {
        let mut items = state.items.clone();
        items.push(value);
        LabState { items }
    });
}

#[async_trait]
impl Screen for LabScreen {
    const NAME: &'static str = "lab";

    type Intent = LabIntent;
    type State = LabState;
    type Effect = LabEffect;

    fn initial_state(&self) -> LabState {
        self.factory_calls.fetch_add(1, Ordering::SeqCst);
        LabState::default()
    }

    async fn on_intent(
        &self,
        intent: LabIntent,
        scope: Scope<LabState, LabEffect>,
    ) -> anyhow::Result<()> {
        self.seen.lock().push(intent.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let result = match intent {
            LabIntent::Push(value) => {
                push(&scope, value);
                Ok(())
            }
            LabIntent::PushSlow(value, millis) => {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                push(&scope, value);
                Ok(())
            }
            LabIntent::FailAfterPush(value) => {
                push(&scope, value);
                Err(anyhow::anyhow!("lab failure {value}"))
            }
            LabIntent::PanicAfterPush(value) => {
                push(&scope, value);
                self.active.fetch_sub(1, Ordering::SeqCst);
                panic!("lab panic {value}");
            }
            LabIntent::Emit(note) => {
                scope.emit_effect(LabEffect::Note(note));
                Ok(())
            }
            LabIntent::Hang(value) => {
                let _flag = DropFlag(Arc::clone(&self.hang_dropped));
                push(&scope, value);
                std::future::pending::<()>().await;
                Ok(())
            }
            LabIntent::SpawnLateWrite(value) => {
                let done = Arc::clone(&self.late_write_done);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    push(&scope, value);
                    done.store(true, Ordering::SeqCst);
                });
                Ok(())
            }
            LabIntent::SlowThreadWrite(value) => {
                let (entered, reducer_started) = tokio::sync::oneshot::channel();
                std::thread::spawn(move || {
                    scope.set_state(|state| {
                        let _ = entered.send(());
                        std::thread::sleep(Duration::from_millis(100));
                        let mut items = state.items.clone();
                        items.push(value);
                        LabState { items }
                    });
                });
                let _ = reducer_started.await;
                Ok(())
            }
            LabIntent::ParallelPush(count) => {
                let scope = Arc::new(scope);
                let writers: Vec<_> = (0..count)
                    .map(|value| {
                        let scope = Arc::clone(&scope);
                        std::thread::spawn(move || push(&scope, value))
                    })
                    .collect();
                tokio::task::spawn_blocking(move || {
                    for writer in writers {
                        let _ = writer.join();
                    }
                })
                .await
                .map_err(anyhow::Error::from)
            }
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Fault sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    pub faults: Mutex<Vec<(String, FaultContext)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn recorded(&self) -> Vec<(String, FaultContext)> {
        self.faults.lock().clone()
    }
}

impl FaultSink for RecordingSink {
    fn report(&self, fault: &ContainerFault, context: &FaultContext) {
        self.faults.lock().push((fault.to_string(), context.clone()));
    }
}

/// Slot whose reads and/or writes always fail.
pub struct BrokenSlot {
    pub fail_reads: bool,
    pub writes: Arc<AtomicUsize>,
}

impl BrokenSlot {
    pub fn write_only_failures() -> Self {
        Self {
            fail_reads: false,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn all_failures() -> Self {
        Self {
            fail_reads: true,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<S> StateSlot<S> for BrokenSlot {
    fn get(&self) -> Result<Option<S>, PersistError> {
        if self.fail_reads {
            return Err(PersistError::read(std::io::Error::other("slot unreadable")));
        }
        Ok(None)
    }

    fn set(&self, _state: &S) -> Result<(), PersistError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(PersistError::write(std::io::Error::other("slot read-only")))
    }
}

/// Await the next value or fail the test.
pub async fn next_within<T>(subscription: &mut Subscription<T>) -> T {
    tokio::time::timeout(WAIT, subscription.recv())
        .await
        .expect("timed out waiting for value")
        .expect("subscription ended")
}

/// Everything already buffered in `subscription`.
pub fn buffered<T>(subscription: &mut Subscription<T>) -> Vec<T> {
    let mut values = Vec::new();
    while let Some(value) = subscription.try_recv() {
        values.push(value);
    }
    values
}

pub fn items(states: &[LabState]) -> Vec<Vec<u32>> {
    states.iter().map(|state| state.items.clone()).collect()
}

/// Poll `condition` until it holds or the wait budget runs out.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
