//! Content sources consumed by screens.

use thiserror::Error;

use crate::mvi::Subscription;

/// Default greeting served by [`StaticWelcomeRepository`].
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to the Espert App!";

/// Errors a repository can emit.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Transport failure (no connectivity, refused connection, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Source of the welcome message, as a success-or-error producer.
pub trait WelcomeRepository: Send + Sync {
    fn welcome_message(&self) -> Subscription<Result<String, RepositoryError>>;
}

/// Repository that serves one fixed message.
#[derive(Debug, Clone)]
pub struct StaticWelcomeRepository {
    message: String,
}

impl StaticWelcomeRepository {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for StaticWelcomeRepository {
    fn default() -> Self {
        Self::new(DEFAULT_WELCOME_MESSAGE)
    }
}

impl WelcomeRepository for StaticWelcomeRepository {
    fn welcome_message(&self) -> Subscription<Result<String, RepositoryError>> {
        let (sender, subscription) = Subscription::channel();
        let _ = sender.send(Ok(self.message.clone()));
        subscription
    }
}
