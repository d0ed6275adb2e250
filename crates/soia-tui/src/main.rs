use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use soia_core::{ChatClient, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod input;
mod markdown;
mod tui;
mod ui;
mod welcome;

use app::App;
use tui::{AppEvent, EventHandler, Tui};

#[derive(Parser)]
#[command(name = "soia", version)]
#[command(about = "Terminal chat client for the SOIA assistant")]
struct Cli {
    /// Base URL of the chat service
    #[arg(long, env = "SOIA_API_URL")]
    api_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Persist --api-url and --timeout to the config file
    #[arg(long)]
    save_config: bool,
    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug)?;

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config file");
        Config::new()
    });
    if let Some(url) = cli.api_url {
        config.api_url = Some(url);
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout_secs = Some(secs);
    }
    if cli.save_config {
        config.save()?;
    }

    let client = ChatClient::with_timeout(config.api_url(), config.request_timeout())?;
    tracing::info!(api_url = client.base_url(), "starting chat client");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(300));
    let mut app = App::new(Arc::new(client.clone()), events.sender());
    app.keyboard_enhanced = tui::keyboard_enhanced();

    // Probe the service once so the header can show whether it is reachable
    let health_tx = events.sender();
    tokio::spawn(async move {
        let online = client.health().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "health check failed");
            false
        });
        let _ = health_tx.send(AppEvent::Health(online));
    });

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(debug: bool) -> Result<()> {
    let log_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?
        .join("soia");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("soia.log"))?;

    let default_filter = if debug {
        "debug,hyper=info,reqwest=info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}
