//! Concrete screens built on the state container.

pub mod counter;
pub mod welcome;

pub use counter::{CounterEffect, CounterIntent, CounterScreen, CounterState};
pub use welcome::{WelcomeEffect, WelcomeIntent, WelcomeScreen, WelcomeState};
