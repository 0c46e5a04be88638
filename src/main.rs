//! llm-copy - markdown for LLMs, one keypress away
//!
//! Lists pages and gives each one a "Copy for LLM" button that puts the
//! page's `.md` rendition on the clipboard, and a "View as Markdown" button
//! that opens it in the browser.

mod app;
mod config;
mod error;
mod models;
mod screens;
mod services;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::models::{markdown_url, CopyContext, Page};
use crate::services::{CopyController, CopyOutcome, HttpMarkdownSource, SystemClipboard};

/// llm-copy - copy page markdown for LLMs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file path (default: ~/.config/llm-copy/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Page permalinks to list alongside the configured ones
    permalinks: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a page's markdown to the clipboard
    Copy {
        /// Page permalink
        permalink: String,
    },
    /// Open a page's markdown in the browser
    View {
        /// Page permalink
        permalink: String,
    },
    /// Print a page's markdown URL
    Url {
        /// Page permalink
        permalink: String,
    },
}

/// Where log output goes.
enum LogTarget {
    Stderr,
    /// The TUI owns the terminal, so logs go to a file.
    File,
}

fn init_logging(debug: bool, target: LogTarget) -> Result<()> {
    let filter = if debug {
        "llm_copy=debug,info"
    } else {
        "llm_copy=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        LogTarget::File => {
            let dir = config::Config::data_dir();
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = dir.join("llm-copy.log");
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }

    Ok(())
}

/// Run one copy on `controller`, writing the label of every state the
/// button passes through to `out`, one per line.
async fn copy_reporting(controller: &CopyController, out: &mut impl Write) -> Result<CopyOutcome> {
    let mut transitions = controller.transitions();
    writeln!(out, "{}", controller.displayed_label())?;

    let labels = &controller.context().labels;
    let run = controller.run_copy();
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            Ok(state) = transitions.recv() => writeln!(out, "{}", state.label(labels))?,
        }
    };
    while let Ok(state) = transitions.try_recv() {
        writeln!(out, "{}", state.label(labels))?;
    }

    Ok(outcome)
}

/// Run one copy from the shell.
async fn copy_once(config: &config::Config, permalink: &str) -> Result<()> {
    let page = Page::new(permalink)?;
    let context = CopyContext::new(page.markdown_url(), config.copy_button.labels());
    let clipboard = Arc::new(SystemClipboard::new().context("Failed to start clipboard worker")?);
    let controller = CopyController::new(
        context,
        Arc::new(HttpMarkdownSource::new()?),
        clipboard.clone(),
    );

    let outcome = copy_reporting(&controller, &mut std::io::stdout().lock()).await?;

    match outcome {
        CopyOutcome::Copied { bytes } => {
            eprintln!("Copied {} bytes from {}", bytes, page.markdown_url());
            eprintln!("Keeping the clipboard until something else is copied");
            clipboard.hold_until_replaced().await?;
            Ok(())
        }
        CopyOutcome::Failed(e) => Err(e.into()),
        CopyOutcome::Skipped => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let target = if args.command.is_some() {
        LogTarget::Stderr
    } else {
        LogTarget::File
    };
    init_logging(args.debug, target)?;

    // Load configuration
    let config = if let Some(path) = args.config {
        config::Config::from_file(&path)?
    } else {
        config::Config::load()?
    };

    match args.command {
        Some(Command::Copy { permalink }) => copy_once(&config, &permalink).await?,
        Some(Command::View { permalink }) => {
            let page = Page::new(permalink)?;
            services::open_markdown(&page.markdown_url())?;
        }
        Some(Command::Url { permalink }) => {
            println!("{}", markdown_url(permalink.trim()));
        }
        None => {
            let pages = config.pages(&args.permalinks)?;
            let mut app = app::App::new(&config, pages)?;
            app.run().await?;
        }
    }

    Ok(())
}
