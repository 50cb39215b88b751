//! Binary entry point: resolve configuration, start file logging, open the
//! component store and hand it to the terminal UI.
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use component_librarian::{run_app, App, Config, Librarian, Overrides, Store};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "component-librarian")]
#[command(about = "Store, browse and search reusable code snippets", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database file (default: ~/.component-librarian/components.sqlite)
    #[arg(short, long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Log file (default: components.log next to the database)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(Overrides {
        database: cli.database,
        log_file: cli.log_file,
        verbose: cli.verbose,
    })?;

    init_logging(&config)?;
    tracing::info!(database = %config.database.display(), "starting component librarian");

    let store = Store::open(&config.database)?;
    let mut app = App::load(Librarian::new(store)).context("failed to load components")?;
    run_app(&mut app)
}

/// Log to a file: stdout and stderr belong to the terminal UI.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create log directory")?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .init();
    Ok(())
}
