//! Content Synthesizer CLI
//!
//! Summarize a page, or synthesize a page and its discussion thread, from
//! the terminal. Logs go to stderr; rendered output goes to stdout.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use synthesizer_core::{AppContext, Config, SynthError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "synthesizer")]
#[command(about = "Summarize and synthesize content from URLs or pasted text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the Gemini API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Summarize one source, or two sources plus a synthesis.
    ///
    /// A source starting with http:// or https:// is fetched through the
    /// content proxy. `@path` reads pasted text from a file and `-` from stdin.
    /// Anything else is used as pasted text.
    Run {
        source1: String,
        source2: Option<String>,
        /// Model for this run (defaults to the selected model)
        #[arg(long)]
        model: Option<String>,
        /// Skin for the output (defaults to the selected skin)
        #[arg(long)]
        skin: Option<String>,
        /// Hide the progress line
        #[arg(long)]
        quiet: bool,
    },

    /// Browse past runs
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Show or select the model
    Model { id: Option<String> },

    /// Show or select the skin
    Skin { id: Option<String> },

    /// List available skins
    Skins,

    /// Export a history entry as a text document
    Export {
        id: String,
        /// Output path, `-` for stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render built-in sample results
    Demo {
        #[arg(long)]
        skin: Option<String>,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store a key (prompts when not given)
    Set { key: Option<String> },
    /// Remove the stored key
    Clear,
    /// Show whether a key is configured
    Status,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List entries, pinned first
    List,
    /// Render one entry
    Show {
        id: String,
        #[arg(long)]
        skin: Option<String>,
    },
    /// Pin or unpin an entry
    Pin { id: String },
    /// Delete all entries
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        match e.downcast_ref::<SynthError>() {
            Some(err) => eprintln!("{} {}", "✗".bright_red(), err),
            None => eprintln!("{} {:#}", "✗".bright_red(), e),
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,synthesizer_core=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Key { action } => match action {
            KeyAction::Set { key } => commands::key_set(&ctx, key),
            KeyAction::Clear => commands::key_clear(&ctx),
            KeyAction::Status => commands::key_status(&ctx),
        },
        Commands::Run {
            source1,
            source2,
            model,
            skin,
            quiet,
        } => commands::run(&ctx, &source1, source2.as_deref(), model, skin, quiet).await,
        Commands::History { action } => match action {
            HistoryAction::List => commands::history_list(&ctx).await,
            HistoryAction::Show { id, skin } => commands::history_show(&ctx, &id, skin).await,
            HistoryAction::Pin { id } => commands::history_pin(&ctx, &id).await,
            HistoryAction::Clear { yes } => commands::history_clear(&ctx, yes).await,
        },
        Commands::Model { id } => commands::model(&ctx, id),
        Commands::Skin { id } => commands::skin(&ctx, id),
        Commands::Skins => commands::skins(&ctx),
        Commands::Export { id, out } => commands::export(&ctx, &id, out).await,
        Commands::Demo { skin } => commands::demo(&ctx, skin),
    }
}
