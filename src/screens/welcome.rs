//! Welcome screen: loads a greeting from a repository.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorHandler;
use crate::mvi::{Effect, Intent, Scope, Screen, UiState};
use crate::repository::WelcomeRepository;
use crate::usecase::{self, LoadWelcomeMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeIntent {
    Load,
    Retry,
    /// Leave the welcome screen once a message is shown.
    Continue,
}

impl Intent for WelcomeIntent {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WelcomeState {
    pub loading: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl UiState for WelcomeState {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeEffect {
    ShowToast(String),
    NavigateHome,
}

impl Effect for WelcomeEffect {}

pub struct WelcomeScreen {
    load_message: Arc<LoadWelcomeMessage>,
    errors: Arc<dyn ErrorHandler>,
}

impl WelcomeScreen {
    pub fn new(repository: Arc<dyn WelcomeRepository>, errors: Arc<dyn ErrorHandler>) -> Self {
        Self {
            load_message: Arc::new(LoadWelcomeMessage::new(repository)),
            errors,
        }
    }

    async fn load(&self, scope: &Scope<WelcomeState, WelcomeEffect>) {
        scope.set_state(|state| WelcomeState {
            loading: true,
            error: None,
            ..state.clone()
        });

        let mut results = usecase::invoke(Arc::clone(&self.load_message), ());
        while let Some(result) = results.recv().await {
            match result {
                Ok(message) => scope.set_state(|_| WelcomeState {
                    loading: false,
                    message: Some(message),
                    error: None,
                }),
                Err(err) => {
                    tracing::debug!("welcome message failed: {err:#}");
                    let text = self.errors.user_message(&*err);
                    scope.set_state(|state| WelcomeState {
                        loading: false,
                        error: Some(text.clone()),
                        ..state.clone()
                    });
                    scope.emit_effect(WelcomeEffect::ShowToast(text));
                }
            }
        }

        // A producer that completes without emitting leaves nothing loading.
        if scope.state().loading {
            scope.set_state(|state| WelcomeState {
                loading: false,
                ..state.clone()
            });
        }
    }
}

#[async_trait]
impl Screen for WelcomeScreen {
    const NAME: &'static str = "welcome";

    type Intent = WelcomeIntent;
    type State = WelcomeState;
    type Effect = WelcomeEffect;

    fn initial_state(&self) -> WelcomeState {
        WelcomeState::default()
    }

    async fn on_intent(
        &self,
        intent: WelcomeIntent,
        scope: Scope<WelcomeState, WelcomeEffect>,
    ) -> anyhow::Result<()> {
        match intent {
            WelcomeIntent::Load | WelcomeIntent::Retry => self.load(&scope).await,
            WelcomeIntent::Continue => {
                if scope.state().message.is_some() {
                    scope.emit_effect(WelcomeEffect::NavigateHome);
                } else {
                    scope.emit_effect(WelcomeEffect::ShowToast(
                        "Nothing loaded yet".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
