//! Rendering of entries and statistics for the terminal.

use std::fmt::Write as _;

use crate::crawlers::truncate_chars;
use crate::entry::Entry;
use crate::error::Result;
use crate::storage::{InsertReport, StorageStats};

use super::OutputFormat;

const TITLE_WIDTH: usize = 60;

/// Render `entries` in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_entries(entries: &[Entry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        OutputFormat::Plain => Ok(render_plain(entries)),
        OutputFormat::Table => Ok(render_table(entries)),
    }
}

fn render_plain(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "[{}] {}", entry.source, entry.title);
        let _ = writeln!(out, "    {}", entry.link);
        if !entry.authors.is_empty() {
            let _ = writeln!(out, "    by {}", entry.authors.join(", "));
        }
        if let Some(published) = &entry.published {
            let _ = writeln!(out, "    published {published}");
        }
        out.push('\n');
    }
    out
}

fn render_table(entries: &[Entry]) -> String {
    let mut out = format!(
        "{:<6} {:<10} {:<16} {}\n",
        "ID", "SOURCE", "FETCHED", "TITLE"
    );
    for entry in entries {
        let id = entry.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let mut title = truncate_chars(&entry.title, TITLE_WIDTH);
        if title.len() < entry.title.len() {
            title.push_str("...");
        }
        let _ = writeln!(
            out,
            "{:<6} {:<10} {:<16} {}",
            id,
            entry.source.to_string(),
            entry.fetched_at.format("%Y-%m-%d %H:%M"),
            title
        );
    }
    out
}

/// Render storage statistics.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
#[allow(clippy::cast_precision_loss)]
pub fn render_stats(stats: &StorageStats, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(stats)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Entries:       {}", stats.total_entries);
    for (source, count) in &stats.by_source {
        let _ = writeln!(out, "  {:<12} {count}", source.to_string());
    }
    let format_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
    };
    let _ = writeln!(out, "Oldest:        {}", format_time(stats.oldest_entry));
    let _ = writeln!(out, "Newest:        {}", format_time(stats.newest_entry));
    let _ = writeln!(
        out,
        "Database size: {:.1} KiB",
        stats.database_size_bytes as f64 / 1024.0
    );
    Ok(out)
}

/// One-line summary of a storage insert.
#[must_use]
pub fn render_insert_report(report: &InsertReport, blocked: usize) -> String {
    format!(
        "Stored {} new entries ({} already known, {} filtered)",
        report.inserted, report.duplicates, blocked
    )
}
