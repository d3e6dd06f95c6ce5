use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;

use espert::config::Config;
use espert::errors::DefaultErrorHandler;
use espert::logging::init_tracing;
use espert::mvi::{
    ContainerBuilder, Effect, Intent, Screen, ScreenContainer, StateContainer, Subscription, UiState,
};
use espert::repository::StaticWelcomeRepository;
use espert::screens::{CounterIntent, CounterScreen, WelcomeIntent, WelcomeScreen};
use espert::storage::{PreferenceSlot, PreferenceStore};

#[derive(Debug, Parser)]
#[command(name = "espert", version, about = "Drive Espert screens from the terminal")]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preferences file, overriding `storage.path`.
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the welcome screen and print its states and effects.
    Welcome,
    /// Apply steps to the counter: inc, dec, reset, or a signed amount.
    Counter {
        #[arg(required = true, allow_hyphen_values = true, value_parser = parse_step)]
        steps: Vec<CounterIntent>,
    },
    /// Remove every stored preference, including persisted screen state.
    Clear,
}

fn parse_step(raw: &str) -> Result<CounterIntent, String> {
    match raw {
        "inc" | "+" => Ok(CounterIntent::Increment),
        "dec" | "-" => Ok(CounterIntent::Decrement),
        "reset" => Ok(CounterIntent::Reset),
        other => other.parse::<i64>().map(CounterIntent::Add).map_err(|_| {
            format!("invalid counter step '{other}' (expected inc, dec, reset, or an integer)")
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading config")?;
    init_tracing(&config.logging);

    let storage_path = cli
        .storage
        .clone()
        .unwrap_or_else(|| config.storage.resolved_path());
    let store = PreferenceStore::open(&storage_path).context("opening preferences")?;

    match cli.command {
        Command::Welcome => {
            let repository = StaticWelcomeRepository::new(config.screens.welcome_message.clone());
            let screen = WelcomeScreen::new(Arc::new(repository), Arc::new(DefaultErrorHandler));
            let container = build(screen, &config, store);
            run(container, vec![WelcomeIntent::Load, WelcomeIntent::Continue]).await;
        }
        Command::Counter { steps } => {
            let container = build(CounterScreen, &config, store);
            run(container, steps).await;
        }
        Command::Clear => {
            store.clear_all().context("clearing preferences")?;
            println!("Cleared preferences in {}", storage_path.display());
        }
    }
    Ok(())
}

fn build<Sc>(screen: Sc, config: &Config, store: PreferenceStore) -> ScreenContainer<Sc>
where
    Sc: Screen,
    Sc::State: Serialize + DeserializeOwned,
{
    let builder = ContainerBuilder::new(screen);
    if config.screens.persist_state {
        builder.persist(PreferenceSlot::for_screen::<Sc>(store)).spawn()
    } else {
        builder.spawn()
    }
}

async fn run<I, S, E>(container: StateContainer<I, S, E>, intents: Vec<I>)
where
    I: Intent,
    S: UiState,
    E: Effect,
{
    let mut states = container.observe_state();
    let mut effects = container.observe_effects();
    for intent in intents {
        container.submit(intent);
    }
    container.drain().await;
    container.tear_down();

    print_buffered("state", &mut states);
    print_buffered("effect", &mut effects);
}

fn print_buffered<T: Debug>(label: &str, subscription: &mut Subscription<T>) {
    while let Some(value) = subscription.try_recv() {
        println!("{label}: {value:?}");
    }
}
