//! Terminal shell for the to-do list.
//!
//! Talks to the service at `TODOS_API_URL`, or to a seeded in-memory
//! collection when it is unset. Type `help` for the command list.

use anyhow::Context;
use std::sync::Arc;
use todomvc::remote::RemoteCollection;
use todomvc::shell::{self, Command};
use todomvc::{
    AppError, Config, HttpCollection, InMemoryCollection, Item, ItemId, TodoApp, TodoEnvironment,
    UserId,
};
use todomvc_core::environment::SystemClock;
use todomvc_runtime::metrics::MetricsRegistry;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn demo_collection(user: UserId) -> InMemoryCollection {
    let seed = [("Read the docs", true), ("Write the shell", false), ("Ship it", false)];
    let items = seed
        .iter()
        .zip(1..)
        .map(|((title, completed), id)| {
            let mut item = Item::new(ItemId::new(id), user, (*title).to_string());
            item.completed = *completed;
            item
        })
        .collect();
    InMemoryCollection::with_items(items)
}

async fn run(app: &TodoApp, metrics: &MetricsRegistry, command: Command) -> bool {
    let result = match command {
        Command::List => Ok(()),
        Command::Reload => app.load().await.map(drop),
        Command::Add(title) => app.add(title).await.map(drop),
        Command::Toggle(id) => app.toggle(id).await.map(drop),
        Command::ToggleAll => app.toggle_all().await,
        Command::Remove(id) => app.remove(id).await,
        Command::ClearCompleted => app.remove_completed().await.map(drop),
        Command::Filter(filter) => app.set_filter(filter).await,
        Command::Dismiss => app.dismiss_notification().await,
        Command::Stats => {
            println!("{}", metrics.render().unwrap_or_else(|| "metrics unavailable".to_string()));
            return true;
        },
        Command::Help => {
            println!("{}", shell::HELP);
            return true;
        },
        Command::Quit => return false,
    };

    match result {
        Err(AppError::Todo(error)) if error.is_rejection() => {
            tracing::debug!(%error, "Command skipped");
            println!("skipped: {error}");
        },
        Err(error) => {
            tracing::debug!(%error, "Operation failed");
            println!("error: {error}");
        },
        Ok(()) => {},
    }
    print!("{}", app.view(shell::render).await);
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| "todomvc=info,todomvc_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut metrics = MetricsRegistry::new();
    metrics.install().context("installing metrics recorder")?;

    let remote: Arc<dyn RemoteCollection> = match &config.api_url {
        Some(url) => {
            tracing::info!(%url, "Using remote collection service");
            Arc::new(HttpCollection::new(url.clone(), config.request_timeout)?)
        },
        None => {
            tracing::info!("TODOS_API_URL not set, using in-memory demo collection");
            Arc::new(demo_collection(config.user_id))
        },
    };

    let env = TodoEnvironment::new(remote, Arc::new(SystemClock), config.user_id)
        .with_notification_ttl(config.notification_ttl);
    let app = TodoApp::new(env).with_response_timeout(config.request_timeout * 2);

    if let Err(error) = app.start().await {
        println!("error: {error}");
    }
    if !config.user_id.is_set() {
        println!("TODOS_USER_ID is not set; nothing was loaded.");
    }
    print!("{}", app.view(shell::render).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match shell::parse(&line) {
            Ok(command) => {
                if !run(&app, &metrics, command).await {
                    break;
                }
            },
            Err(shell::ParseError::Empty) => {},
            Err(error) => println!("{error}"),
        }
    }

    app.shutdown(config.shutdown_timeout)
        .await
        .context("shutting down")?;
    Ok(())
}
