use anyhow::{Context, Result};
use clap::Parser;
use clipdeck::app::App;
use clipdeck::cache::ImageCache;
use clipdeck::engine::{logging, Config};
use clipdeck::input::clipboard;
use clipdeck::rendering::{fallback_notice, CapabilityDetector, GraphicsMode};
use clipdeck::storage::DirStorage;
use clipdeck::ui::{GraphicsContext, TuiManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Clipboard history in the terminal, with inline image previews
#[derive(Parser, Debug)]
#[command(name = "clipdeck")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (default: <config_dir>/clipdeck/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// History directory
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Inline image support: probe the terminal, force kitty, or disable
    #[arg(long, value_enum)]
    graphics: Option<GraphicsMode>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Store the current clipboard contents and exit
    #[arg(long)]
    capture: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = args.history_dir {
        config.storage.history_dir = Some(dir);
    }
    if let Some(mode) = args.graphics {
        config.graphics.mode = mode;
    }
    config.validate().context("Invalid configuration")?;

    let _log_guard =
        logging::init(&config.logging, args.verbose).context("Failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "clipdeck starting");

    let history_dir = config.storage.history_dir();
    let store = Arc::new(
        DirStorage::open(&history_dir)
            .with_context(|| format!("Failed to open history at {}", history_dir.display()))?,
    );

    if args.capture {
        let meta = clipboard::capture_into(store.as_ref()).context("Clipboard capture failed")?;
        println!("{}", meta.id);
        return Ok(());
    }

    let capability = CapabilityDetector::new().resolve(config.graphics.mode);
    info!(?capability, mode = ?config.graphics.mode, "Resolved terminal graphics");
    let graphics = GraphicsContext::new(capability, &config.graphics);

    let cache = ImageCache::new(store.clone(), &config.cache).context("Failed to start image cache")?;
    let mut app = App::new(store, cache).context("Failed to read history")?;
    if !capability.supports_graphics() {
        app.set_status(fallback_notice());
    }

    let mut tui = TuiManager::new(graphics).context("Failed to set up terminal")?;
    tui.run_event_loop(&mut app)?;

    info!("clipdeck exiting");
    Ok(())
}
