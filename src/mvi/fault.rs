//! Faults a container recovers from, and where it reports them.

use std::any::Any;
use std::fmt;

use thiserror::Error;

use super::persist::PersistError;

/// Errors a container contains instead of propagating.
#[derive(Debug, Error)]
pub enum ContainerFault {
    /// The intent handler returned an error.
    #[error("intent handler failed: {0:#}")]
    Handler(anyhow::Error),

    /// The intent handler panicked.
    #[error("intent handler panicked: {message}")]
    Panicked { message: String },

    /// Reading or writing the persisted state slot failed.
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

/// Where a fault happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultContext {
    /// `Screen::NAME` of the owning screen.
    pub screen: &'static str,
    /// Debug rendering of the intent being processed, if any.
    pub intent: Option<String>,
}

impl fmt::Display for FaultContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.intent {
            Some(intent) => write!(f, "{} while handling {}", self.screen, intent),
            None => write!(f, "{}", self.screen),
        }
    }
}

/// Receives faults a container recovered from. Must not panic.
pub trait FaultSink: Send + Sync {
    fn report(&self, fault: &ContainerFault, context: &FaultContext);
}

/// Default sink: logs every fault at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn report(&self, fault: &ContainerFault, context: &FaultContext) {
        tracing::error!(
            screen = context.screen,
            intent = context.intent.as_deref().unwrap_or("-"),
            "{fault}"
        );
    }
}

/// Text of a panic payload caught from a task.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
