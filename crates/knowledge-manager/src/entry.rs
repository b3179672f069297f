//! Core entry types for knowledge-manager.
//!
//! An [`Entry`] is one ingested item: a feed article, an arXiv paper, a
//! crawled web page or a processed video transcript.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS or Atom feed article.
    Rss,
    /// arXiv API result.
    Arxiv,
    /// Crawled web page.
    Web,
    /// Processed video transcript.
    Transcript,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rss => write!(f, "rss"),
            Self::Arxiv => write!(f, "arxiv"),
            Self::Web => write!(f, "web"),
            Self::Transcript => write!(f, "transcript"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rss" => Ok(Self::Rss),
            "arxiv" => Ok(Self::Arxiv),
            "web" => Ok(Self::Web),
            "transcript" => Ok(Self::Transcript),
            other => Err(Error::internal(format!("unknown source kind: {other}"))),
        }
    }
}

/// An ingested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Which crawler produced the entry.
    pub source: SourceKind,

    /// Feed URL, arXiv query, start URL or video id.
    pub origin: String,

    /// Title of the item.
    pub title: String,

    /// Canonical link.
    pub link: String,

    /// Abstract or feed summary; empty when the source has none.
    #[serde(default)]
    pub summary: String,

    /// Publication time as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,

    /// Last update time as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// Author names.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Category or tag terms.
    #[serde(default)]
    pub categories: Vec<String>,

    /// When the entry was fetched.
    pub fetched_at: DateTime<Utc>,

    /// BLAKE3 hash of the link, used for deduplication.
    pub fingerprint: String,
}

impl Entry {
    /// Create a new entry, computing its fingerprint and fetch time.
    #[must_use]
    pub fn new(
        source: SourceKind,
        origin: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let link = link.into();
        let fingerprint = Self::compute_fingerprint(&link);
        Self {
            id: None,
            source,
            origin: origin.into(),
            title: title.into(),
            link,
            summary: String::new(),
            published: None,
            updated: None,
            authors: Vec::new(),
            categories: Vec::new(),
            fetched_at: Utc::now(),
            fingerprint,
        }
    }

    /// Compute the BLAKE3 fingerprint of a link.
    ///
    /// Surrounding whitespace and a trailing slash do not change the result.
    #[must_use]
    pub fn compute_fingerprint(link: &str) -> String {
        let normalized = link.trim().trim_end_matches('/');
        blake3::hash(normalized.as_bytes()).to_hex().to_string()
    }

    /// Set the summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set publication and update times.
    #[must_use]
    pub fn with_dates(mut self, published: Option<String>, updated: Option<String>) -> Self {
        self.published = published;
        self.updated = updated;
        self
    }

    /// Set the author list.
    #[must_use]
    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    /// Set the category list.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Host part of the link, if it parses as a URL.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    }
}

/// A source of entries.
///
/// Implementors pull from one kind of upstream (feeds, arXiv) and hand back
/// whatever they found. Per-item problems are logged by the implementor;
/// an `Err` means the whole fetch failed.
#[async_trait::async_trait]
pub trait Crawler: Send + Sync {
    /// The name of this crawler (for logging).
    fn name(&self) -> &'static str;

    /// The kind of entries this crawler produces.
    fn source(&self) -> SourceKind;

    /// Fetch entries from upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream cannot be reached at all.
    async fn fetch(&self) -> crate::error::Result<Vec<Entry>>;
}
