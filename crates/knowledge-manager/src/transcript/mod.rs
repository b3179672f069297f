//! Cached video transcript pipeline.
//!
//! For a video the pipeline produces, under `{base_dir}/{video_id}/`:
//!
//! 1. `original_transcript.md` - the caption text
//! 2. `corrected_transcript.md` and `title_{Title}.txt` - LLM correction
//! 3. `paragraph_summaries.md` - one bullet per paragraph
//! 4. `summary.md` - overall summary
//!
//! Every step is skipped when its output already exists, unless forced.

mod timedtext;

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use url::Url;

use crate::agent::{sanitize_folder_name, write_artifact};
use crate::entry::{Entry, SourceKind};
use crate::error::{Error, Result};
use crate::llm::prompts::{
    paragraph_prompt, transcript_correction_prompt, transcript_summary_prompt,
    PARAGRAPH_SUMMARY_SYSTEM, TRANSCRIPT_CORRECTION_SYSTEM, TRANSCRIPT_SUMMARY_SYSTEM,
};
use crate::llm::{generate_structured, GenerateRequest, LanguageModel};

pub use timedtext::{decode_char_refs, parse_timed_text, TimedTextSource};

const ORIGINAL_FILE: &str = "original_transcript.md";
const CORRECTED_FILE: &str = "corrected_transcript.md";
const PARAGRAPHS_FILE: &str = "paragraph_summaries.md";
const SUMMARY_FILE: &str = "summary.md";
const TITLE_PREFIX: &str = "title_";

const SUMMARY_TEMPERATURE: f32 = 0.3;

static ID_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid regex"));

static ID_IN_SHORT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("valid regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

/// Extract the 11-character video id from a YouTube URL.
#[must_use]
pub fn extract_video_id(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
            if v.len() == 11 {
                return Some(v.into_owned());
            }
        }
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            if segment.len() == 11 {
                return Some(segment.to_string());
            }
        }
    }

    [&ID_IN_URL, &ID_IN_SHORT_URL]
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL of a video.
#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// One caption segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Start offset in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Caption text.
    pub text: String,
}

/// Join segment texts into one transcript.
#[must_use]
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A provider of video captions.
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync + std::fmt::Debug {
    /// Fetch the caption segments of `video_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TranscriptUnavailable`] when the video has no
    /// usable captions, or a transport error.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Files produced for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptArtifacts {
    /// Video id.
    pub video_id: String,
    /// `{base_dir}/{video_id}`.
    pub video_dir: PathBuf,
    /// Video title chosen during correction, if known.
    pub title: Option<String>,
    /// `original_transcript.md`.
    pub original: PathBuf,
    /// `corrected_transcript.md`.
    pub corrected: PathBuf,
    /// `paragraph_summaries.md`.
    pub paragraph_summaries: PathBuf,
    /// `summary.md`.
    pub summary: PathBuf,
}

impl TranscriptArtifacts {
    fn new(video_id: &str, video_dir: PathBuf) -> Self {
        Self {
            video_id: video_id.to_string(),
            original: video_dir.join(ORIGINAL_FILE),
            corrected: video_dir.join(CORRECTED_FILE),
            paragraph_summaries: video_dir.join(PARAGRAPHS_FILE),
            summary: video_dir.join(SUMMARY_FILE),
            title: None,
            video_dir,
        }
    }

    /// A [`SourceKind::Transcript`] entry for the video, carrying the
    /// overall summary when it exists.
    #[must_use]
    pub fn entry(&self) -> Entry {
        let title = self.title.clone().unwrap_or_else(|| self.video_id.clone());
        let summary = std::fs::read_to_string(&self.summary).unwrap_or_default();
        Entry::new(
            SourceKind::Transcript,
            self.video_id.clone(),
            title,
            watch_url(&self.video_id),
        )
        .with_summary(summary)
    }
}

#[derive(Debug, Deserialize)]
struct Correction {
    title: String,
    transcript: String,
}

/// Fetch, correct and summarize video transcripts with on-disk caching.
#[derive(Debug, Clone)]
pub struct TranscriptPipeline {
    source: Arc<dyn TranscriptSource>,
    model: Arc<dyn LanguageModel>,
    base_dir: PathBuf,
}

impl TranscriptPipeline {
    /// Create a pipeline writing under `base_dir`.
    #[must_use]
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        model: Arc<dyn LanguageModel>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            model,
            base_dir: base_dir.into(),
        }
    }

    /// Process the video at `url`.
    ///
    /// Returns `Ok(None)` when no transcript could be fetched. Failures of
    /// the summary steps are logged and leave their file missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVideoUrl`] when no video id can be found, or
    /// an error if the correction step or a file write fails.
    pub async fn process(&self, url: &str, force: bool) -> Result<Option<TranscriptArtifacts>> {
        let Some(video_id) = extract_video_id(url) else {
            error!(url, "Could not extract video id from URL");
            return Err(Error::InvalidVideoUrl {
                url: url.to_string(),
            });
        };

        let video_dir = self.base_dir.join(&video_id);
        std::fs::create_dir_all(&video_dir).map_err(|source| Error::DirectoryCreate {
            path: video_dir.clone(),
            source,
        })?;
        let mut artifacts = TranscriptArtifacts::new(&video_id, video_dir);

        // 1. Original transcript
        let transcript = if !force && artifacts.original.is_file() {
            info!(path = %artifacts.original.display(), "Skipping transcript fetch, file exists");
            std::fs::read_to_string(&artifacts.original)?
        } else {
            info!(video_id = %video_id, "Fetching transcript");
            let transcript = match self.source.fetch(&video_id).await {
                Ok(segments) => join_segments(&segments),
                Err(e) => {
                    error!(video_id = %video_id, error = %e, "Transcript fetch failed");
                    return Ok(None);
                }
            };
            write_artifact(&artifacts.video_dir, ORIGINAL_FILE, &transcript)?;
            info!(path = %artifacts.original.display(), "Transcript saved");
            transcript
        };

        // 2. Correction and title
        let existing_title = find_title(&artifacts.video_dir);
        let corrected = match existing_title {
            Some(title) if !force && artifacts.corrected.is_file() => {
                info!(path = %artifacts.corrected.display(), "Skipping correction, file exists");
                artifacts.title = Some(title);
                std::fs::read_to_string(&artifacts.corrected)?
            }
            _ => {
                info!("Correcting transcript with LLM");
                let correction = self.correct(&transcript).await?;
                write_artifact(&artifacts.video_dir, CORRECTED_FILE, &correction.transcript)?;
                let title_file = title_file_name(&correction.title);
                write_artifact(&artifacts.video_dir, &title_file, &correction.title)?;
                info!(title = %correction.title, "Corrected transcript and title saved");
                artifacts.title = Some(correction.title);
                correction.transcript
            }
        };

        // 3. Paragraph summaries
        if !force && artifacts.paragraph_summaries.is_file() {
            info!(path = %artifacts.paragraph_summaries.display(), "Skipping paragraph summaries, file exists");
        } else {
            info!("Generating paragraph summaries");
            let text = self.summarize_paragraphs(&corrected).await;
            if let Err(e) = write_artifact(&artifacts.video_dir, PARAGRAPHS_FILE, &text) {
                error!(error = %e, "Failed to save paragraph summaries");
            }
        }

        // 4. Overall summary
        if !force && artifacts.summary.is_file() {
            info!(path = %artifacts.summary.display(), "Skipping summary, file exists");
        } else {
            info!("Generating summary");
            let result = self.summarize(&corrected).await.and_then(|summary| {
                write_artifact(&artifacts.video_dir, SUMMARY_FILE, &summary)
            });
            match result {
                Ok(path) => info!(path = %path.display(), "Summary saved"),
                Err(e) => error!(error = %e, "Failed to generate summary"),
            }
        }

        info!(video_id = %video_id, "Processing complete");
        Ok(Some(artifacts))
    }

    async fn correct(&self, transcript: &str) -> Result<Correction> {
        let request = GenerateRequest::new(
            TRANSCRIPT_CORRECTION_SYSTEM,
            transcript_correction_prompt(transcript),
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": {"type": "STRING", "description": "One-line title of the transcript."},
                "transcript": {"type": "STRING", "description": "The corrected transcript text."}
            },
            "required": ["title", "transcript"]
        });
        generate_structured(self.model.as_ref(), request, schema).await
    }

    async fn summarize(&self, corrected: &str) -> Result<String> {
        let request =
            GenerateRequest::new(TRANSCRIPT_SUMMARY_SYSTEM, transcript_summary_prompt(corrected))
                .with_temperature(SUMMARY_TEMPERATURE);
        self.model.generate(&request).await
    }

    /// One bullet per paragraph, `- P{i}: ...`.
    async fn summarize_paragraphs(&self, corrected: &str) -> String {
        let paragraphs = split_paragraphs(corrected);
        if paragraphs.is_empty() {
            return "Paragraph Summaries:\n- (No content)".to_string();
        }

        let mut lines = Vec::with_capacity(paragraphs.len());
        for (i, paragraph) in paragraphs.iter().enumerate() {
            let index = i + 1;
            let request =
                GenerateRequest::new(PARAGRAPH_SUMMARY_SYSTEM, paragraph_prompt(index, paragraph));
            let line = match self.model.generate(&request).await {
                Ok(answer) => format!("- P{index}: {}", bullet_text(&answer)),
                Err(e) => {
                    error!(paragraph = index, error = %e, "Paragraph summarization failed");
                    format!("- P{index}: (summary failed)")
                }
            };
            lines.push(line);
        }
        format!("Paragraph Summaries:\n{}", lines.join("\n"))
    }
}

/// Non-empty paragraphs separated by two or more newlines.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// First line of a model answer without its leading bullet dashes.
fn bullet_text(answer: &str) -> &str {
    answer
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches(['-', ' '])
        .trim()
}

/// `title_{Title_With_Underscores}.txt`, sanitized and length-capped.
fn title_file_name(title: &str) -> String {
    format!("{TITLE_PREFIX}{}.txt", sanitize_folder_name(title))
}

/// Title stored in the first `title_*.txt` file of `dir`.
fn find_title(dir: &Path) -> Option<String> {
    let mut titles: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "txt")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(TITLE_PREFIX))
        })
        .collect();
    titles.sort();
    let path = titles.into_iter().next()?;
    std::fs::read_to_string(path).ok().map(|t| t.trim().to_string())
}
