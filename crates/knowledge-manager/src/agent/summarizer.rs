//! Page-by-page summarization agent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::web::CrawlRun;
use super::write_artifact;
use crate::error::Result;
use crate::llm::prompts::{page_summary_prompt, SUMMARIZATION_SYSTEM};
use crate::llm::{generate_structured, GenerateRequest, LanguageModel, Pacer};

/// Summaries directory inside a run.
pub const SUMMARIES_DIR: &str = "summaries";

#[derive(Debug, Deserialize)]
struct PageSummary {
    summary: String,
}

/// Summarizes fetched pages and persists per-page and combined summaries.
#[derive(Debug, Clone)]
pub struct SummarizerAgent {
    model: Arc<dyn LanguageModel>,
    pacer: Pacer,
}

impl SummarizerAgent {
    /// Create a summarizer.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, pacer: Pacer) -> Self {
        Self { model, pacer }
    }

    /// Summarize `pages` into `summary_dir` and return the combined summary path.
    ///
    /// A page whose summary fails gets an error note instead; the other
    /// pages are still summarized.
    ///
    /// # Errors
    ///
    /// Returns an error if a summary file cannot be written.
    pub async fn summarize(&self, pages: &[String], summary_dir: &Path) -> Result<PathBuf> {
        let total = pages.len();
        let mut summaries = Vec::with_capacity(total);

        for (i, page) in pages.iter().enumerate() {
            let index = i + 1;
            let request = GenerateRequest::new(SUMMARIZATION_SYSTEM, page_summary_prompt(index, total, page));
            let schema = json!({
                "type": "OBJECT",
                "properties": {"summary": {"type": "STRING"}},
                "required": ["summary"]
            });

            let text = match generate_structured::<PageSummary>(self.model.as_ref(), request, schema).await {
                Ok(answer) => answer.summary,
                Err(e) => {
                    error!(page = index, error = %e, "Summary generation failed");
                    format!("(Error summarizing page {index}: {e})")
                }
            };

            let path = write_artifact(summary_dir, &format!("page_{index}_summary.md"), &text)?;
            info!(page = index, path = %path.display(), "Saved page summary");
            summaries.push(text);
            self.pacer.pause().await;
        }

        let combined = combine(&summaries);
        let path = write_artifact(summary_dir, "combined_summary.md", &combined)?;
        info!(path = %path.display(), "Combined summary saved");
        Ok(path)
    }

    /// Summarize a crawl run into `{run_dir}/summaries` and copy the
    /// combined text to `{run_dir}/summary.txt`.
    ///
    /// # Errors
    ///
    /// Returns an error if a summary file cannot be written or read back.
    pub async fn summarize_run(&self, run: &CrawlRun) -> Result<PathBuf> {
        let combined_path = self
            .summarize(&run.pages, &run.run_dir.join(SUMMARIES_DIR))
            .await?;
        let combined = std::fs::read_to_string(&combined_path)?;
        let path = write_artifact(&run.run_dir, "summary.txt", &combined)?;
        info!(path = %path.display(), "Summary saved");
        Ok(path)
    }
}

fn combine(summaries: &[String]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, text)| format!("# Page {} Summary\n{text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}
