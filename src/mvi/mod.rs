//! Model-View-Intent (MVI) state container.
//!
//! Every screen gets one [`StateContainer`]: a single source of truth, a
//! serialized mutation path, and a decoupled channel for one-shot effects.
//!
//! # Architecture
//!
//! ```text
//! submit(Intent) ──→ queue ──→ Screen::on_intent ──→ Scope::set_state ──→ State ──→ observers
//!      ↑                                  │
//!      │                                  └──→ Scope::emit_effect ──→ Effect ──→ observers
//!      └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **State**: immutable snapshot, replayed to new observers
//! - **Intent**: user actions or system events, processed strictly FIFO
//! - **Effect**: one-shot events, delivered only to current observers
//! - **Screen**: initial state plus the intent handler

mod container;
mod effect;
mod fault;
mod intent;
mod lifecycle;
mod observers;
mod persist;
mod scope;
mod screen;
mod state;

pub use container::{ContainerBuilder, ScreenContainer, StateContainer};
pub use effect::Effect;
pub use fault::{ContainerFault, FaultContext, FaultSink, TracingFaultSink};
pub(crate) use fault::panic_message;
pub use intent::Intent;
pub use observers::Subscription;
pub use persist::{MemorySlot, PersistError, StateSlot, STATE_KEY};
pub use scope::Scope;
pub use screen::Screen;
pub use state::UiState;
