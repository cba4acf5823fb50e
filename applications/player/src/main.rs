/// Carousel Player - console media player
use anyhow::Context;
use carousel_player::{console, HostFocus, LibraryScanner, PlayerConfig, SymphoniaEngine};
use carousel_playback::{ChannelPublisher, Collaborators, Extras, PlaybackController};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "carousel-player")]
#[command(about = "Console media player with a looping queue", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CAROUSEL_CONFIG")]
    config: Option<PathBuf>,

    /// Music directory (overrides library.root)
    #[arg(short, long)]
    library: Option<PathBuf>,

    /// Refuse every audio focus request
    #[arg(long)]
    deny_focus: bool,

    /// Item id to start playing immediately
    #[arg(long)]
    play: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PlayerConfig::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        config.library.root = library;
    }
    if cli.deny_focus {
        config.focus.deny_requests = true;
    }

    // Initialize tracing (stderr, so the console output stays readable)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    config.validate()?;

    tracing::info!("Starting Carousel Player");
    tracing::info!("Library: {}", config.library.root.display());

    let catalog = LibraryScanner::from_settings(&config.library).catalog(&config.library.root)?;
    if catalog.is_empty() {
        tracing::warn!("No audio files found");
    }
    let items = catalog.items().to_vec();

    let (session, updates) = ChannelPublisher::new();
    let handle = PlaybackController::spawn(
        config.controller.clone(),
        Collaborators {
            engine: Box::new(SymphoniaEngine::new()),
            focus: Box::new(HostFocus::new(config.focus.deny_requests)),
            catalog: Box::new(catalog),
            session: Box::new(session),
        },
    )?;
    let printer = console::spawn_printer(updates).context("failed to start console printer")?;

    if let Some(item_id) = cli.play {
        handle.play_from_id(item_id, Extras::new())?;
    }

    console::run(&handle, &items, io::stdin().lock(), &mut io::stdout())?;

    handle.destroy();
    drop(handle);
    printer
        .join()
        .map_err(|_| anyhow::anyhow!("console printer panicked"))?;

    tracing::info!("Goodbye");
    Ok(())
}
