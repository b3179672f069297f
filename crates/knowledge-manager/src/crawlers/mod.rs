//! Upstream crawlers.
//!
//! - [`RssCrawler`]: RSS/Atom feeds
//! - [`ArxivCrawler`]: the arXiv query API
//! - [`PageFetcher`]: single web pages rendered as markdown
//!
//! All of them share one HTTP client shape built by [`http_client`].

mod arxiv;
mod page;
mod rss;

use std::time::Duration;

use reqwest::Client;

use crate::config::CrawlConfig;
use crate::error::{Error, Result};

pub use arxiv::ArxivCrawler;
pub use page::{FetchedPage, PageFetcher};
pub use rss::RssCrawler;

/// Longest response body kept in an [`Error::HttpStatus`].
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client used by crawlers.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(config: &CrawlConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// A successful GET response body.
#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub text: String,
    pub content_type: Option<String>,
}

/// GET a URL and return its body, mapping non-2xx answers to [`Error::HttpStatus`].
pub(crate) async fn get_body(client: &Client, url: &str) -> Result<Body> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate_chars(&body, MAX_ERROR_BODY),
        });
    }

    Ok(Body {
        text: response.text().await?,
        content_type,
    })
}

/// Truncate to at most `max` characters without splitting a character.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
