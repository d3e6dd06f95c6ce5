//! Use cases: business operations that sit between repositories and screens.
//!
//! A use case runs on its own task and reports every failure, including a
//! panic, as an `Err` item on its result stream instead of unwinding into
//! the screen that consumes it.

mod welcome;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::mvi::{panic_message, Subscription};

pub use welcome::LoadWelcomeMessage;

/// Results of one use case invocation, in emission order.
pub type Outcomes<T> = Subscription<anyhow::Result<T>>;

/// Sending half handed to [`UseCase::execute`].
pub struct Emitter<T> {
    sender: UnboundedSender<anyhow::Result<T>>,
}

impl<T> Emitter<T> {
    /// Emit a value. Returns `false` once the consumer is gone.
    pub fn emit(&self, value: T) -> bool {
        self.sender.send(Ok(value)).is_ok()
    }

    /// Emit a recoverable failure and keep going.
    pub fn fail(&self, error: impl Into<anyhow::Error>) -> bool {
        self.sender.send(Err(error.into())).is_ok()
    }
}

#[async_trait]
pub trait UseCase: Send + Sync + 'static {
    /// Name used in logs and panic reports.
    const NAME: &'static str;

    type Params: Send + 'static;
    type Output: Send + 'static;

    /// Produce results through `out`. Returning an error ends the stream
    /// with that error as its last item.
    async fn execute(
        &self,
        params: Self::Params,
        out: &Emitter<Self::Output>,
    ) -> anyhow::Result<()>;
}

/// Run `use_case` on a spawned task and return its result stream.
///
/// Must be called from within a tokio runtime.
pub fn invoke<U: UseCase>(use_case: Arc<U>, params: U::Params) -> Outcomes<U::Output> {
    let (sender, outcomes) = Subscription::channel();
    let emitter = Emitter {
        sender: sender.clone(),
    };
    let task = tokio::spawn(async move { use_case.execute(params, &emitter).await });

    tokio::spawn(async move {
        let failure = match task.await {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(err) => match err.try_into_panic() {
                Ok(payload) => {
                    anyhow::anyhow!("{} panicked: {}", U::NAME, panic_message(payload))
                }
                Err(err) => anyhow::Error::new(err).context(format!("{} did not finish", U::NAME)),
            },
        };
        tracing::debug!(use_case = U::NAME, "use case failed: {failure:#}");
        let _ = sender.send(Err(failure));
    });

    outcomes
}
