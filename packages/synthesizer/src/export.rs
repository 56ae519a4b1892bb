//! Plain-text export of a run.

use crate::history::HistoryEntry;

pub const APP_NAME: &str = "Content Synthesizer";

/// Metadata block, title, then one section per present result.
pub fn export_document(entry: &HistoryEntry) -> String {
    let mut meta = vec![
        format!("App: {}", APP_NAME),
        format!("Created: {}", entry.created_at.to_rfc3339()),
        format!("Model: {}", entry.model),
    ];
    let optional = [
        ("Source 1", &entry.url1),
        ("Source 2", &entry.url2),
        ("HN Thread", &entry.hn_thread_url),
        ("HN Title", &entry.hn_title),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            meta.push(format!("{}: {}", label, value));
        }
    }

    let title = entry
        .hn_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Content Synthesis");

    let mut doc = meta.join("\n");
    doc.push_str(&format!("\n\n# {}\n", title));

    let sections = [
        ("Summary 1", &entry.results.summary1),
        ("Summary 2", &entry.results.summary2),
        ("Synthesis", &entry.results.synthesis),
    ];
    for (heading, body) in sections {
        if let Some(body) = body {
            doc.push_str(&format!("\n## {}\n{}\n", heading, body.trim_end()));
        }
    }

    doc
}

/// Default file name for an exported entry.
pub fn export_file_name(entry: &HistoryEntry) -> String {
    format!(
        "synthesis-{}.md",
        entry.created_at.format("%Y%m%d-%H%M%S")
    )
}
