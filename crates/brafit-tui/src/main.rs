use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use brafit_core::{ChatStore, Config, FittingClient};
use tui::{EventSource, TerminalSession, Tui};

#[derive(Parser)]
#[command(name = "brafit")]
#[command(version, about = "Chat with a bra fitting service from your terminal")]
struct Cli {
    /// Base URL of the recommendation service (defaults to the config file)
    #[arg(long, env = "BRAFIT_API_URL")]
    api_url: Option<String>,
    /// Write logs here instead of the default location
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Remember --api-url in the config file
    #[arg(long, requires = "api_url")]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::new(), Some(err)),
    };

    let log_path = logging::init(cli.log_file.as_deref(), config.log_level.as_deref())?;
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "Ignoring unreadable config file");
    }

    if cli.save {
        if let Some(url) = cli.api_url.as_deref() {
            Config::save_api_base_url(url)?;
            tracing::info!(url, "Saved service URL to config");
        }
    }

    let base_url = config.resolve_base_url(cli.api_url.as_deref());
    tracing::info!(%base_url, log = %log_path.display(), "Starting brafit");

    let client = FittingClient::new(&base_url);
    let mut app = App::new(ChatStore::new(client.clone()), base_url);
    app.start_health_probe(client);

    let mut session = TerminalSession::enter()?;
    let result = run(session.terminal_mut(), &mut app).await;
    drop(session);

    if let Err(err) = &result {
        tracing::error!(error = %err, "Exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventSource::new(app.subscribe());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next(app.needs_tick()).await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}
