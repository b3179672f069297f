//! Single-page fetcher.

use reqwest::Client;
use tracing::debug;

use super::get_body;
use crate::error::Result;
use crate::markdown::{document_title, html_to_markdown};

/// A page fetched and rendered as markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL that was requested.
    pub url: String,
    /// Page content as markdown.
    pub markdown: String,
    /// `<title>` of the page, when it had one.
    pub title: Option<String>,
}

/// Fetches web pages and renders them as markdown.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher on top of an HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and convert it to markdown.
    ///
    /// Plain-text and markdown bodies are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    pub async fn fetch_markdown(&self, url: &str) -> Result<FetchedPage> {
        let body = get_body(&self.client, url).await?;

        let verbatim = body
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/plain") || ct.starts_with("text/markdown"));

        let (markdown, title) = if verbatim {
            (body.text.trim().to_string(), None)
        } else {
            (html_to_markdown(&body.text, url), document_title(&body.text))
        };

        debug!(url, chars = markdown.chars().count(), "Fetched page");
        Ok(FetchedPage {
            url: url.to_string(),
            markdown,
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::crawlers::http_client;
    use crate::error::Error;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(http_client(&CrawlConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/post")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(
                r#"<html><head><title>Post</title></head>
                <body><h2>Intro</h2><p>Read <a href="/post?page=2">more</a></p></body></html>"#,
            )
            .create_async()
            .await;

        let url = format!("{}/post", server.url());
        let page = fetcher().fetch_markdown(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.title.as_deref(), Some("Post"));
        assert!(page.markdown.starts_with("## Intro"));
        assert!(page
            .markdown
            .contains(&format!("[more]({}/post?page=2)", server.url())));
    }

    #[tokio::test]
    async fn test_fetch_plain_text_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/notes.md")
            .with_status(200)
            .with_header("content-type", "text/markdown")
            .with_body("# Notes\n\n<b>kept</b>\n")
            .create_async()
            .await;

        let page = fetcher()
            .fetch_markdown(&format!("{}/notes.md", server.url()))
            .await
            .unwrap();
        assert_eq!(page.markdown, "# Notes\n\n<b>kept</b>");
        assert!(page.title.is_none());
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(410)
            .create_async()
            .await;

        let err = fetcher()
            .fetch_markdown(&format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 410, .. }));
    }
}
