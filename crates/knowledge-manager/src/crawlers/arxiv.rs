//! arXiv query API crawler.

use reqwest::Client;
use tracing::{error, info};
use url::Url;

use super::get_body;
use super::rss::preferred_link;
use crate::entry::{Crawler, Entry, SourceKind};
use crate::error::{Error, Result};

/// Runs search queries against the arXiv API, newest updates first.
#[derive(Debug, Clone)]
pub struct ArxivCrawler {
    client: Client,
    base_url: String,
    queries: Vec<String>,
    limit: usize,
}

impl ArxivCrawler {
    /// Create a crawler for `queries` against the API at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, queries: Vec<String>, limit: usize) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            queries,
            limit,
        }
    }

    /// Build the query URL for a search.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn query_url(&self, query: &str, limit: usize) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/api/query"))
            .map_err(|e| Error::invalid_url(&self.base_url, e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("search_query", query)
            .append_pair("max_results", &limit.to_string())
            .append_pair("sortBy", "lastUpdatedDate")
            .append_pair("sortOrder", "descending");
        Ok(url)
    }

    /// Fetch entries for one query.
    ///
    /// An unparsable response is logged and yields no entries; transport
    /// and status errors are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the API cannot be reached.
    pub async fn fetch_query(&self, query: &str, limit: usize) -> Result<Vec<Entry>> {
        info!(query, "Fetching arxiv");
        let url = self.query_url(query, limit)?;
        let body = get_body(&self.client, url.as_str()).await?;

        match parse_arxiv(query, &body.text) {
            Ok(entries) => {
                info!(query, count = entries.len(), "Fetched arxiv entries");
                Ok(entries)
            }
            Err(e) => {
                error!(query, error = %e, "Error parsing arxiv feed");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait::async_trait]
impl Crawler for ArxivCrawler {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    fn source(&self) -> SourceKind {
        SourceKind::Arxiv
    }

    async fn fetch(&self) -> Result<Vec<Entry>> {
        let mut all = Vec::new();
        for query in &self.queries {
            all.extend(self.fetch_query(query, self.limit).await?);
        }
        Ok(all)
    }
}

/// Parse an arXiv Atom response.
///
/// # Errors
///
/// Returns [`Error::FeedParse`] when the document is not valid Atom.
pub fn parse_arxiv(query: &str, document: &str) -> Result<Vec<Entry>> {
    let feed = feed_rs::parser::parse(document.as_bytes())
        .map_err(|e| Error::feed_parse(query, e.to_string()))?;

    Ok(feed
        .entries
        .iter()
        .filter_map(|item| {
            let link = preferred_link(item)?;
            let title = item
                .title
                .as_ref()
                .map(|t| collapse(&t.content))
                .unwrap_or_default();
            let summary = item
                .summary
                .as_ref()
                .map(|t| collapse(&t.content))
                .unwrap_or_default();
            // First author only, as listed on the abstract page.
            let authors = item
                .authors
                .first()
                .map(|p| vec![p.name.clone()])
                .unwrap_or_default();

            Some(
                Entry::new(SourceKind::Arxiv, query, title, link)
                    .with_summary(summary)
                    .with_dates(
                        item.published.map(|d| d.to_rfc3339()),
                        item.updated.map(|d| d.to_rfc3339()),
                    )
                    .with_authors(authors)
                    .with_categories(item.categories.iter().map(|c| c.term.clone()).collect()),
            )
        })
        .collect())
}

/// arXiv wraps titles and abstracts at fixed columns.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
