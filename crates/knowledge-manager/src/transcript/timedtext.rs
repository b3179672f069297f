//! Transcript source backed by the YouTube timed-text endpoint.

use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};
use reqwest::Client;
use tracing::info;
use url::Url;

use super::{TranscriptSegment, TranscriptSource};
use crate::crawlers::truncate_chars;
use crate::error::{Error, Result};

static CHAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([xX][0-9a-fA-F]+|[0-9]+);").expect("valid regex"));

/// Fetches captions from `{base}/api/timedtext?lang=L&v=ID`.
#[derive(Debug, Clone)]
pub struct TimedTextSource {
    client: Client,
    base_url: String,
    language: String,
}

impl TimedTextSource {
    /// Create a source for captions in `language`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            language: language.into(),
        }
    }

    fn endpoint(&self, video_id: &str) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/api/timedtext"))
            .map_err(|e| Error::invalid_url(&self.base_url, e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("lang", &self.language)
            .append_pair("v", video_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl TranscriptSource for TimedTextSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let url = self.endpoint(video_id)?;
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::transcript_unavailable(
                video_id,
                format!("status {}: {}", status.as_u16(), truncate_chars(&body, 200)),
            ));
        }
        if body.trim().is_empty() {
            return Err(Error::transcript_unavailable(
                video_id,
                "captions are disabled or missing for this language",
            ));
        }

        let segments = parse_timed_text(&body).map_err(|e| {
            Error::transcript_unavailable(video_id, format!("malformed timed text: {e}"))
        })?;
        if segments.is_empty() {
            return Err(Error::transcript_unavailable(
                video_id,
                "no caption segments found",
            ));
        }
        info!(video_id, count = segments.len(), "Fetched transcript segments");
        Ok(segments)
    }
}

/// Parse `<text start dur>` elements of a timed-text document.
///
/// The XML layer is decoded by the reader; numeric character references
/// left inside caption text (`&amp;#39;` in the document) are decoded once
/// more.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML.
pub fn parse_timed_text(
    document: &str,
) -> std::result::Result<Vec<TranscriptSegment>, quick_xml::Error> {
    let mut reader = Reader::from_str(document);
    let mut segments = Vec::new();
    let mut open: Option<(f64, f64, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) if element.name().as_ref() == b"text" => {
                open = Some((
                    attr_secs(&element, "start")?,
                    attr_secs(&element, "dur")?,
                    String::new(),
                ));
            }
            Event::Text(text) => {
                if let Some((_, _, buf)) = open.as_mut() {
                    buf.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some((_, _, buf)) = open.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(element) if element.name().as_ref() == b"text" => {
                if let Some((start, duration, raw)) = open.take() {
                    let text = decode_char_refs(&raw)
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ");
                    if !text.is_empty() {
                        segments.push(TranscriptSegment {
                            start,
                            duration,
                            text,
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(segments)
}

fn attr_secs(element: &BytesStart<'_>, name: &str) -> std::result::Result<f64, quick_xml::Error> {
    Ok(element
        .try_get_attribute(name)?
        .and_then(|attr| attr.unescape_value().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default())
}

/// Decode numeric character references (`&#39;`, `&#x27;`).
///
/// Named entities are left alone.
#[must_use]
pub fn decode_char_refs(text: &str) -> String {
    CHAR_REF
        .replace_all(text, |caps: &Captures<'_>| {
            let reference = &caps[1];
            let code = match reference.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => reference.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::crawlers::http_client;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.16" dur="2.5">so today we&amp;#39;re going to</text>
<text start="2.66" dur="3">talk about &lt;b&gt;rust&lt;/b&gt;
and tokio</text>
<text start="5.66" dur="1"></text>
</transcript>"#;

    #[test]
    fn test_parse_timed_text() {
        let segments = parse_timed_text(DOC).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "so today we're going to");
        assert!((segments[0].start - 0.16).abs() < f64::EPSILON);
        assert!((segments[0].duration - 2.5).abs() < f64::EPSILON);
        assert_eq!(segments[1].text, "talk about <b>rust</b> and tokio");
    }

    #[test]
    fn test_entities_decoded_once() {
        let doc = r#"<transcript><text start="1" dur="1">a &amp;lt; b &amp;amp; c</text></transcript>"#;
        let segments = parse_timed_text(doc).unwrap();
        assert_eq!(segments[0].text, "a &lt; b &amp; c");
    }

    #[test]
    fn test_parse_timed_text_malformed() {
        assert!(parse_timed_text(r#"<transcript><text start="1">a</transcript>"#).is_err());
    }

    #[test]
    fn test_decode_char_refs() {
        assert_eq!(decode_char_refs("&#39;q&#x27;"), "'q'");
        assert_eq!(decode_char_refs("&#xZZ; &amp; &lt;"), "&#xZZ; &amp; &lt;");
        assert_eq!(decode_char_refs("&#1114112;"), "&#1114112;");
    }

    fn source(base: &str) -> TimedTextSource {
        TimedTextSource::new(http_client(&CrawlConfig::default()).unwrap(), base, "en")
    }

    #[tokio::test]
    async fn test_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/timedtext")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("lang".into(), "en".into()),
                mockito::Matcher::UrlEncoded("v".into(), "dQw4w9WgXcQ".into()),
            ]))
            .with_status(200)
            .with_body(DOC)
            .create_async()
            .await;

        let segments = source(&server.url()).fetch("dQw4w9WgXcQ").await.unwrap();
        mock.assert_async().await;
        assert_eq!(segments.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_empty_body_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/timedtext")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let err = source(&server.url()).fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, Error::TranscriptUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/timedtext")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<transcript><text start=\"1\">cut</transcript>")
            .create_async()
            .await;

        let err = source(&server.url()).fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, Error::TranscriptUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_status_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/timedtext")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let err = source(&server.url()).fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
