//! RSS/Atom feed crawler.

use feed_rs::model::Entry as FeedEntry;
use reqwest::Client;
use tracing::{info, warn};

use super::get_body;
use crate::entry::{Crawler, Entry, SourceKind};
use crate::error::{Error, Result};

/// Pulls the latest articles from a list of feeds.
#[derive(Debug, Clone)]
pub struct RssCrawler {
    client: Client,
    feeds: Vec<String>,
    limit: usize,
}

impl RssCrawler {
    /// Create a crawler over `feeds`, keeping at most `limit` entries per feed.
    #[must_use]
    pub fn new(client: Client, feeds: Vec<String>, limit: usize) -> Self {
        Self {
            client,
            feeds,
            limit,
        }
    }

    /// The configured feed URLs.
    #[must_use]
    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    /// Fetch and parse one feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be downloaded or parsed.
    pub async fn fetch_feed(&self, feed_url: &str, limit: usize) -> Result<Vec<Entry>> {
        let body = get_body(&self.client, feed_url).await?;
        parse_feed(feed_url, &body.text, limit)
    }
}

#[async_trait::async_trait]
impl Crawler for RssCrawler {
    fn name(&self) -> &'static str {
        "rss"
    }

    fn source(&self) -> SourceKind {
        SourceKind::Rss
    }

    async fn fetch(&self) -> Result<Vec<Entry>> {
        let mut all = Vec::new();

        for feed_url in &self.feeds {
            info!(feed = %feed_url, "Fetching articles");
            match self.fetch_feed(feed_url, self.limit).await {
                Ok(entries) if entries.is_empty() => {
                    info!(feed = %feed_url, "No articles found in feed");
                }
                Ok(entries) => {
                    info!(feed = %feed_url, count = entries.len(), "Fetched articles");
                    all.extend(entries);
                }
                Err(e) => {
                    warn!(feed = %feed_url, error = %e, "Failed to fetch feed, skipping");
                }
            }
        }

        if all.is_empty() {
            warn!("No articles were fetched from any of the configured feeds");
        }
        Ok(all)
    }
}

/// Parse a feed document into entries, keeping the first `limit` items.
///
/// # Errors
///
/// Returns [`Error::FeedParse`] when the document is not a valid feed.
pub fn parse_feed(feed_url: &str, document: &str, limit: usize) -> Result<Vec<Entry>> {
    let feed = feed_rs::parser::parse(document.as_bytes())
        .map_err(|e| Error::feed_parse(feed_url, e.to_string()))?;

    Ok(feed
        .entries
        .iter()
        .take(limit)
        .filter_map(|item| to_entry(feed_url, item))
        .collect())
}

fn to_entry(feed_url: &str, item: &FeedEntry) -> Option<Entry> {
    let link = preferred_link(item)?;
    let title = item
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let summary = item
        .summary
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    Some(
        Entry::new(SourceKind::Rss, feed_url, title, link)
            .with_summary(summary)
            .with_dates(
                item.published.map(|d| d.to_rfc3339()),
                item.updated.map(|d| d.to_rfc3339()),
            )
            .with_authors(item.authors.iter().map(|p| p.name.clone()).collect())
            .with_categories(item.categories.iter().map(|c| c.term.clone()).collect()),
    )
}

/// The `alternate` link if present, otherwise the first link.
pub(crate) fn preferred_link(item: &FeedEntry) -> Option<String> {
    item.links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .or_else(|| item.links.first())
        .map(|l| l.href.clone())
}
