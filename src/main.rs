use std::env;
use std::path::PathBuf;
use std::time::Duration;

use agentchat::agent::config::{ClientConfig, ConfigOverrides};
use agentchat::app::App;
use agentchat::event::Event;
use agentchat::logging::init_client_logging;
use agentchat::tui::{Tui, init, restore};
use agentchat::ui::render;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::EventStream;
use futures_util::StreamExt;
use log::{error, info};

/// Terminal chat client for the agent backend.
#[derive(Parser, Debug)]
#[command(name = "agentchat", version, about)]
struct Args {
    /// Backend base URL. Overrides the environment variable and config file.
    #[arg(long)]
    backend_url: Option<String>,
    /// Directory for saved conversations, settings and the log file.
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// Answer with the built-in simulated agent instead of calling the backend.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let workspace_root = env::current_dir().context("failed to read the working directory")?;
    let config = ClientConfig::resolve(
        &workspace_root,
        ConfigOverrides {
            backend_url: args.backend_url,
            state_dir: args.state_dir,
            offline: args.offline,
        },
    )?;
    std::fs::create_dir_all(&config.state_dir)
        .with_context(|| format!("failed to create {}", config.state_dir.display()))?;
    init_client_logging(&workspace_root, &config.state_dir)?;
    info!(
        "Starting agentchat against {} (offline: {})",
        config.backend_url, config.offline
    );

    let mut app = App::new(config)?;
    let mut tui = init()?;
    let outcome = run(&mut tui, &mut app).await;
    restore()?;
    if let Err(err) = &outcome {
        error!("UI loop failed: {:#}", err);
    }
    outcome
}

async fn run(tui: &mut Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(Duration::from_millis(250));

    while !app.should_quit {
        tui.draw(|frame| render(frame, app))?;

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(raw)) => match Event::from_terminal(raw) {
                        Some(event) => event,
                        None => continue,
                    },
                    // The terminal went away.
                    Some(Err(_)) | None => break,
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => {
                app.handle_key(key);
                // Apply replies that landed while the key was being handled.
                app.on_tick();
            }
            Event::Resize => {}
        }
    }
    Ok(())
}
