use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod audio;
mod cli;
mod config;
mod library;
mod mpris;
mod navigation;
mod runtime;
mod ui;

use cli::{Cli, Command};
use library::FileCatalog;

const DEFAULT_LOG_FILTER: &str = "sonicloud=info";

fn open_log_file() -> Option<File> {
    let path = config::resolve_log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Install the tracing subscriber. The terminal player owns the screen, so
/// its logs go to a file; the other subcommands log to stderr.
fn init_tracing(to_file: bool) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    );

    if to_file {
        if let Some(file) = open_log_file() {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        return;
    }

    registry
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Play);

    init_tracing(command == Command::Play);

    let settings = runtime::load_settings();
    let catalog_path = cli
        .catalog_path(&settings)
        .ok_or("no catalog path: pass --catalog or set HOME")?;
    if let Some(parent) = catalog_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut catalog = FileCatalog::open(&catalog_path)?;
    info!(catalog = %catalog_path.display(), ?command, "starting");

    match command {
        Command::Play => runtime::run(&settings, catalog),
        command => {
            let mut stdout = std::io::stdout();
            let result = cli::run_command(command, &mut catalog, &settings, &mut stdout);
            if let Err(e) = &result {
                warn!("command failed: {e}");
            }
            result
        }
    }
}
