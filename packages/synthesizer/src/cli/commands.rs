//! Command implementations

use anyhow::{Context, Result};
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use synthesizer_core::export::{export_document, export_file_name};
use synthesizer_core::fixtures;
use synthesizer_core::{
    AppContext, HistoryEntry, ModelId, RunRequest, RunResult, SkinId, SkinView, SourceInput,
    Status,
};

// =============================================================================
// Credential
// =============================================================================

pub fn key_set(ctx: &AppContext, key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => prompt_for_key()?,
    };
    ctx.set_credential(&key)?;
    println!("{}", "✓ API key saved".bright_green());
    Ok(())
}

pub fn key_clear(ctx: &AppContext) -> Result<()> {
    ctx.reset_credential()?;
    println!("{}", "✓ API key removed".bright_green());
    if ctx.config().gemini_api_key.is_some() {
        println!(
            "{}",
            "  GEMINI_API_KEY is still set in the environment".yellow()
        );
    }
    Ok(())
}

pub fn key_status(ctx: &AppContext) -> Result<()> {
    let source = if ctx.config().gemini_api_key.is_some() {
        Some("environment")
    } else if ctx.preferences().api_key()?.is_some() {
        Some("stored")
    } else {
        None
    };
    match source {
        Some(source) => println!("{} API key configured ({})", "✓".bright_green(), source),
        None => println!(
            "{} No API key. Run {}",
            "✗".bright_red(),
            "synthesizer key set".bold()
        ),
    }
    Ok(())
}

fn prompt_for_key() -> Result<String> {
    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Gemini API key")
        .interact()
        .context("Failed to read API key")?;
    Ok(key)
}

// =============================================================================
// Run
// =============================================================================

pub async fn run(
    ctx: &AppContext,
    source1: &str,
    source2: Option<&str>,
    model: Option<String>,
    skin: Option<String>,
    quiet: bool,
) -> Result<()> {
    let model = match model {
        Some(id) => id.parse::<ModelId>()?,
        None => ctx.preferences().model(),
    };
    let source1 = parse_source(source1)?;
    let request = match source2 {
        Some(source2) => RunRequest::dual(model, source1, parse_source(source2)?),
        None => RunRequest::single(model, source1),
    };

    if !ctx.has_credential() && std::io::stdin().is_terminal() {
        println!("{}", "An API key is required to run.".yellow());
        let key = prompt_for_key()?;
        ctx.set_credential(&key)?;
    }

    let progress = (!quiet).then(|| spawn_progress(ctx));
    let outcome = ctx.run(&request).await;
    if let Some(progress) = progress {
        progress.abort();
        let _ = Term::stderr().clear_line();
    }
    let result = outcome?;

    let entry = ctx.history().entries().await.into_iter().next();
    let hn_title = entry.as_ref().and_then(|e| e.hn_title.clone());
    let skin = resolve_skin(ctx, skin);
    let view = SkinView {
        result: &result,
        url1: request.source1.url(),
        url2: request.source2.as_ref().and_then(|s| s.url()),
        hn_title: hn_title.as_deref(),
    };
    print!("{}", ctx.skins().get(skin).render(&view));

    if let Some(entry) = entry {
        println!(
            "{} Saved to history as {}",
            "✓".bright_green(),
            short_id(&entry).bold()
        );
    }
    Ok(())
}

/// `http(s)://...` is a URL, `@path` a file, `-` stdin, anything else text.
fn parse_source(arg: &str) -> Result<SourceInput> {
    let trimmed = arg.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(SourceInput::Url(trimmed.to_string()));
    }
    if trimmed == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(SourceInput::Text(text));
    }
    if let Some(path) = trimmed.strip_prefix('@') {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path))?;
        return Ok(SourceInput::Text(text));
    }
    Ok(SourceInput::Text(arg.to_string()))
}

/// Prints the status line on stderr until the run ends.
fn spawn_progress(ctx: &AppContext) -> tokio::task::JoinHandle<()> {
    let mut rx = ctx.orchestrator().subscribe();
    tokio::spawn(async move {
        let term = Term::stderr();
        let mut last = Status::Idle;
        while rx.changed().await.is_ok() {
            let (status, chars) = {
                let snap = rx.borrow_and_update();
                (snap.status, streamed_chars(&snap.result))
            };
            if status.is_terminal() {
                break;
            }
            if status == Status::Idle && last == Status::Idle {
                continue;
            }
            last = status;
            let line = match chars {
                0 => format!("{} {}", "…".cyan(), status.label()),
                n => format!("{} {} ({} chars)", "…".cyan(), status.label(), n),
            };
            let _ = term.clear_line();
            let _ = term.write_str(&line);
        }
    })
}

fn streamed_chars(result: &RunResult) -> usize {
    [&result.summary1, &result.summary2, &result.synthesis]
        .into_iter()
        .flatten()
        .map(|s| s.chars().count())
        .sum()
}

fn resolve_skin(ctx: &AppContext, name: Option<String>) -> SkinId {
    match name {
        Some(name) => ctx.skins().resolve(&name).id(),
        None => ctx.preferences().skin(),
    }
}

// =============================================================================
// History
// =============================================================================

fn short_id(entry: &HistoryEntry) -> String {
    entry.id.to_string()[..8].to_string()
}

pub async fn history_list(ctx: &AppContext) -> Result<()> {
    let entries = ctx.history().display_order().await;
    if entries.is_empty() {
        println!("{}", "No history yet".dimmed());
        return Ok(());
    }
    for entry in entries {
        let pin = if entry.pinned { "★".yellow() } else { " ".normal() };
        println!(
            "{} {}  {}  {}  {}",
            pin,
            short_id(&entry).bold(),
            entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.display_title(),
            entry.model.label().dimmed()
        );
    }
    Ok(())
}

pub async fn history_show(ctx: &AppContext, id: &str, skin: Option<String>) -> Result<()> {
    let entry = ctx.history().find(id).await?;
    let skin = resolve_skin(ctx, skin);
    print!("{}", ctx.skins().get(skin).render(&entry_view(&entry)));
    Ok(())
}

pub async fn history_pin(ctx: &AppContext, id: &str) -> Result<()> {
    let entry = ctx.history().find(id).await?;
    ctx.history().toggle_pin(entry.id).await?;
    let state = if entry.pinned { "Unpinned" } else { "Pinned" };
    println!("{} {} {}", "✓".bright_green(), state, entry.display_title());
    Ok(())
}

pub async fn history_clear(ctx: &AppContext, yes: bool) -> Result<()> {
    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete all history entries?")
            .default(false)
            .interact()?;
    if !confirmed {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }
    ctx.history().clear_all().await?;
    println!("{}", "✓ History cleared".bright_green());
    Ok(())
}

fn entry_view(entry: &HistoryEntry) -> SkinView<'_> {
    SkinView {
        result: &entry.results,
        url1: entry.url1.as_deref(),
        url2: entry.url2.as_deref(),
        hn_title: entry.hn_title.as_deref(),
    }
}

// =============================================================================
// Preferences
// =============================================================================

pub fn model(ctx: &AppContext, id: Option<String>) -> Result<()> {
    if let Some(id) = id {
        let model = id.parse::<ModelId>()?;
        ctx.preferences().set_model(model)?;
        println!("{} Model set to {}", "✓".bright_green(), model.label().bold());
        return Ok(());
    }
    let current = ctx.preferences().model();
    for model in ModelId::ALL {
        let marker = if model == current { "●".bright_green() } else { "○".dimmed() };
        println!("{} {:<24} {}", marker, model.as_str(), model.label().dimmed());
    }
    Ok(())
}

pub fn skin(ctx: &AppContext, id: Option<String>) -> Result<()> {
    match id {
        Some(id) => {
            let skin = id.parse::<SkinId>()?;
            ctx.preferences().set_skin(skin)?;
            println!("{} Skin set to {}", "✓".bright_green(), skin.as_str().bold());
        }
        None => println!("{}", ctx.preferences().skin()),
    }
    Ok(())
}

pub fn skins(ctx: &AppContext) -> Result<()> {
    let current = ctx.preferences().skin();
    for skin in SkinId::ALL {
        let marker = if skin == current { "●".bright_green() } else { "○".dimmed() };
        println!("{} {:<10} {}", marker, skin.as_str(), skin.description().dimmed());
    }
    Ok(())
}

// =============================================================================
// Export and demo
// =============================================================================

pub async fn export(ctx: &AppContext, id: &str, out: Option<PathBuf>) -> Result<()> {
    let entry = ctx.history().find(id).await?;
    let doc = export_document(&entry);

    let path = out.unwrap_or_else(|| PathBuf::from(export_file_name(&entry)));
    if path.as_os_str() == "-" {
        print!("{}", doc);
        return Ok(());
    }
    std::fs::write(&path, doc).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Exported to {}", "✓".bright_green(), path.display());
    Ok(())
}

pub fn demo(ctx: &AppContext, skin: Option<String>) -> Result<()> {
    let entry = fixtures::demo_entry();
    let skin = resolve_skin(ctx, skin);
    print!("{}", ctx.skins().get(skin).render(&entry_view(&entry)));
    Ok(())
}
