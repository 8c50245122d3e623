//! Canvas - a live Markdown canvas for the terminal.
//!
//! # Usage
//!
//! ```bash
//! canvas
//! canvas --watch path/to/canvas
//! canvas --file notes.md --mouse
//! ```

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use canvas_tui::app::{App, terminal_active};
use canvas_tui::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use canvas_tui::files::{
    DEFAULT_CANVAS_DIR, drafts_dir, ensure_drafts_dir, find_canvas_dir, initial_file, scan_files,
};
use canvas_tui::markdown::RenderOptions;

/// A live Markdown canvas for the terminal
#[derive(Parser, Debug)]
#[command(name = "canvas", version, about, long_about = None)]
struct Cli {
    /// Canvas directory, searched for upwards from the working directory
    #[arg(short, long, value_name = "DIR")]
    watch: Option<PathBuf>,

    /// File to show instead of the newest draft
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Start with mouse wheel scrolling enabled
    #[arg(short, long)]
    mouse: bool,

    /// Show link URLs after the link text
    #[arg(long)]
    show_urls: bool,

    /// Write log output to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save the current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl From<&Cli> for ConfigFlags {
    fn from(cli: &Cli) -> Self {
        Self {
            mouse: cli.mouse,
            show_urls: cli.show_urls,
            watch_dir: cli.watch.clone(),
            log_file: cli.log_file.clone(),
        }
    }
}

/// Install the tracing subscriber.
///
/// Without a log file, events go to stderr only while the terminal is not
/// owned by the UI.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(|| -> Box<dyn io::Write> {
                    if terminal_active() {
                        Box::new(io::sink())
                    } else {
                        Box::new(io::stderr())
                    }
                })
                .init();
        }
    }
    Ok(())
}

/// Locate or create the canvas directory and its drafts folder.
fn prepare_canvas_dir(watch: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let relative = watch.unwrap_or_else(|| Path::new(DEFAULT_CANVAS_DIR));
    let canvas_dir = find_canvas_dir(&cwd, relative).unwrap_or_else(|| cwd.join(relative));
    ensure_drafts_dir(&canvas_dir)
        .with_context(|| format!("Failed to create canvas directory {}", canvas_dir.display()))?;
    std::path::absolute(&canvas_dir)
        .with_context(|| format!("Invalid canvas directory {}", canvas_dir.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = ConfigFlags::from(&cli);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_deref())?;

    let canvas_dir = prepare_canvas_dir(effective.watch_dir.as_deref())?;
    let drafts = scan_files(&drafts_dir(&canvas_dir)).unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to list drafts");
        Vec::new()
    });
    let explicit = cli
        .file
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .context("Invalid file path")?;
    let file_path = initial_file(&canvas_dir, explicit.as_deref(), &drafts);
    tracing::info!(
        canvas = %canvas_dir.display(),
        file = %file_path.display(),
        "starting"
    );

    let render_options = RenderOptions {
        show_link_urls: effective.show_urls,
    };
    App::new(file_path, canvas_dir)
        .with_mouse_capture(effective.mouse)
        .with_render_options(render_options)
        .run()
        .context("Application error")
}
