//! Batch crawl input.
//!
//! A batch file is a `;`-separated CSV with a header row and one
//! `url; crawl` row per start page.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// One start page of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    /// Start URL.
    pub url: String,
    /// Follow pagination from this URL.
    pub crawl: bool,
}

/// Read a batch file.
///
/// # Errors
///
/// Returns [`Error::BatchFileNotFound`] if `path` does not exist, or a CSV
/// error if it cannot be read.
pub fn read_batch_csv(path: &Path) -> Result<Vec<BatchRow>> {
    if !path.exists() {
        return Err(Error::BatchFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(url) = record.get(0).map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        let crawl = record.get(1).is_some_and(is_truthy);
        rows.push(BatchRow {
            url: url.to_string(),
            crawl,
        });
    }

    info!(count = rows.len(), path = %path.display(), "Loaded batch entries");
    Ok(rows)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

/// Whether to summarize after fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryChoice {
    /// Ask on the terminal once fetching is done.
    #[default]
    Ask,
    /// Summarize without asking.
    Always,
    /// Never summarize.
    Never,
}

impl SummaryChoice {
    /// Build from the `--summary` / `--no-summary` flags; `--no-summary` wins.
    #[must_use]
    pub fn from_flags(summary: bool, no_summary: bool) -> Self {
        if no_summary {
            Self::Never
        } else if summary {
            Self::Always
        } else {
            Self::Ask
        }
    }

    /// Resolve the choice, prompting with `question` on `output` and reading
    /// the answer from `input` for [`SummaryChoice::Ask`].
    ///
    /// Only `y` (case-insensitive) means yes; EOF means no.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn resolve<R: BufRead, W: Write>(
        self,
        question: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<bool> {
        match self {
            Self::Always => Ok(true),
            Self::Never => Ok(false),
            Self::Ask => {
                write!(output, "{question} (y/n): ")?;
                output.flush()?;
                let mut answer = String::new();
                input.read_line(&mut answer)?;
                Ok(answer.trim().eq_ignore_ascii_case("y"))
            }
        }
    }
}
