//! Binary entry point: resolve the base directory, load the suggestion lists,
//! open the store and hand everything to the Ratatui event loop.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};
use labparts::datasheet::select_viewer;
use labparts::{fetch_components, open_store, run_app, App, AppPaths, Settings};
use log::info;

/// Terminal inventory of lab electronic components.
#[derive(Debug, Parser)]
#[command(name = "labparts", version, about)]
struct Cli {
    /// Directory holding db/, data/ and the linked datasheets
    #[arg(long, env = "LABPARTS_HOME")]
    base_dir: Option<PathBuf>,

    /// Program used to open datasheets instead of the system default
    #[arg(long)]
    viewer: Option<String>,
}

/// Everything that can fail before the terminal is taken over bubbles up here
/// and is printed to stderr with a non-zero exit code.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::resolve(cli.base_dir)?;

    let settings = Settings::load(&paths.data_file)?;
    init_logging(&paths.log_file)?;
    info!("starting with base directory {}", paths.base_dir.display());

    let conn = open_store(&paths.database)?;
    let components = fetch_components(&conn)?;
    let linked = components.iter().filter(|c| c.has_datasheet()).count();
    info!("loaded {} components, {linked} with datasheets", components.len());

    let viewer_program = cli.viewer.or_else(|| settings.viewer.clone());
    let viewer = select_viewer(viewer_program.as_deref(), &paths.base_dir);
    info!("datasheets open with {}", viewer.name());

    let mut app = App::new(conn, paths, settings, viewer, components);
    run_app(&mut app)
}

/// The TUI owns stdout/stderr, so log records go to a file. `RUST_LOG`
/// overrides the default `info` level.
fn init_logging(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
