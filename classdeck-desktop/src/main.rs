//! classdeck: terminal client for generating lesson slides.
//!
//! Wires the WebSocket transport, the workflow dispatcher and an
//! in-memory deck into one tokio event loop. Transport events, typed
//! commands and reconnect timers are all processed one at a time by the
//! dispatcher; notices and progress are printed as they arrive.

mod commands;
mod view;

use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use classdeck_collab::{ClientConfig, JsonFileSettingsStore, TransportEvent, WsTransport};
use classdeck_core::Deck;
use classdeck_workflow::{DeckCollaborator, Dispatcher, Effect, QueueEvent};
use commands::Command;
use view::ReviewSnapshot;

#[derive(Parser)]
#[command(name = "classdeck")]
#[command(about = "Generate, review and insert language-lesson slides")]
struct Cli {
    /// WebSocket server URL (overrides CLASSDECK_WS_URL)
    #[arg(long)]
    url: Option<String>,

    /// Presentation path; class settings are stored per document
    #[arg(long)]
    document: Option<String>,

    /// Settings directory (overrides CLASSDECK_SETTINGS_DIR)
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Write the deck as JSON here on exit
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.url {
        config.server_url = Some(url);
    }
    if let Some(dir) = cli.settings_dir {
        config.settings_dir = dir;
    }

    info!(
        "Starting classdeck (server: {})",
        config.server_url.as_deref().unwrap_or("<not configured>")
    );

    let (queue_tx, mut queue_rx) = mpsc::unbounded_channel::<QueueEvent>();
    let (transport_tx, mut transport_rx) = mpsc::unbounded_channel::<TransportEvent>();
    let (output_tx, mut output_rx) = mpsc::unbounded_channel::<Effect>();

    // Transport events join the single queue.
    let forward = queue_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = transport_rx.recv().await {
            if forward.send(event.into()).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        while let Some(effect) = output_rx.recv().await {
            if let Some(line) = view::render_effect(&effect) {
                println!("{line}");
            }
        }
    });

    let mut dispatcher = Dispatcher::new(
        &config,
        WsTransport::new(config.server_url.clone(), transport_tx),
        DeckCollaborator::default(),
        JsonFileSettingsStore::new(&config.settings_dir),
        cli.document.as_deref(),
        queue_tx,
        output_tx,
    );

    println!("{}", commands::HELP);

    let startup = tokio::time::sleep(config.startup_delay);
    tokio::pin!(startup);
    let mut started = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = ReviewSnapshot::default();

    loop {
        tokio::select! {
            _ = &mut startup, if !started => {
                started = true;
                dispatcher.connect();
            }
            Some(event) = queue_rx.recv() => {
                dispatcher.dispatch(event).await;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match commands::parse(&line) {
                    Ok(Some(Command::Intent(intent))) => dispatcher.dispatch(intent.into()).await,
                    Ok(Some(Command::Help)) => println!("{}", commands::HELP),
                    Ok(Some(Command::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => println!("✗ {e}"),
                },
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read input: {e}");
                    break;
                }
            },
        }

        let snapshot = ReviewSnapshot::capture(dispatcher.workflow());
        if snapshot != shown {
            if let Some(slide) = snapshot.render() {
                println!("{slide}");
            }
            shown = snapshot;
        }
    }

    dispatcher.shutdown();

    let deck = dispatcher.collaborator().deck();
    info!("Exiting with {} slide(s) in the deck", deck.pages.len());
    if let Some(path) = cli.out {
        match export_deck(&path, deck) {
            Ok(()) => info!("Deck written to {}", path.display()),
            Err(e) => log::error!("Failed to write deck to {}: {e}", path.display()),
        }
    }
}

fn export_deck(path: &Path, deck: &Deck) -> std::io::Result<()> {
    let json = deck.to_json()?;
    std::fs::write(path, json)
}
