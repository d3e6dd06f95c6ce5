mod common;

use common::buffered;
use espert::mvi::StateContainer;
use espert::screens::{CounterEffect, CounterIntent, CounterScreen, CounterState};

#[tokio::test]
async fn add_accepts_signed_amounts() {
    let container = StateContainer::builder(CounterScreen).spawn();
    container.submit(CounterIntent::Add(10));
    container.submit(CounterIntent::Add(-4));
    container.drain().await;
    assert_eq!(container.current_state(), CounterState { count: 6 });
}

#[tokio::test]
async fn reset_emits_previous_count() {
    let container = StateContainer::builder(CounterScreen)
        .seed(CounterState { count: 9 })
        .spawn();
    let mut effects = container.observe_effects();

    container.submit(CounterIntent::Reset);
    container.drain().await;

    assert_eq!(container.current_state(), CounterState::default());
    assert_eq!(
        buffered(&mut effects),
        vec![CounterEffect::WasReset { from: 9 }]
    );
}
