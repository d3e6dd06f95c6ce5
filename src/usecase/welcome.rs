use std::sync::Arc;

use async_trait::async_trait;

use super::{Emitter, UseCase};
use crate::repository::WelcomeRepository;

/// Streams the welcome message from a repository.
pub struct LoadWelcomeMessage {
    repository: Arc<dyn WelcomeRepository>,
}

impl LoadWelcomeMessage {
    pub fn new(repository: Arc<dyn WelcomeRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase for LoadWelcomeMessage {
    const NAME: &'static str = "load_welcome_message";

    type Params = ();
    type Output = String;

    async fn execute(&self, _params: (), out: &Emitter<String>) -> anyhow::Result<()> {
        let mut messages = self.repository.welcome_message();
        while let Some(result) = messages.recv().await {
            let delivered = match result {
                Ok(message) => out.emit(message),
                Err(err) => out.fail(err),
            };
            if !delivered {
                break;
            }
        }
        Ok(())
    }
}
