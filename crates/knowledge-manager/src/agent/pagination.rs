//! Next-page detection.

use serde::Deserialize;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::error::Result;
use crate::llm::prompts::{next_page_prompt, NEXT_PAGE_SYSTEM};
use crate::llm::{generate_structured, GenerateRequest, LanguageModel};

/// Structured answer of the pagination prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NextPage {
    /// Candidate URL, possibly relative or empty.
    #[serde(default)]
    pub next_page_url: Option<String>,
    /// 0 (none) to 2 (confident).
    #[serde(default)]
    pub confidence: Option<i64>,
}

fn next_page_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "next_page_url": {"type": "STRING", "nullable": true},
            "confidence": {"type": "INTEGER"}
        },
        "required": ["confidence"]
    })
}

/// Ask `model` for the page following `current_url`.
///
/// Returns `Ok(None)` when the model finds no continuation or proposes a
/// link that cannot be followed.
///
/// # Errors
///
/// Returns an error if the model call fails or its answer is not the
/// expected JSON.
pub async fn find_next_page(
    model: &dyn LanguageModel,
    content: &str,
    current_url: &str,
) -> Result<Option<String>> {
    info!(url = current_url, "Asking LLM for the next page");
    let request = GenerateRequest::new(NEXT_PAGE_SYSTEM, next_page_prompt(content, current_url));
    let answer: NextPage = generate_structured(model, request, next_page_schema()).await?;
    info!(
        next_page_url = ?answer.next_page_url,
        confidence = ?answer.confidence,
        "LLM next page answer"
    );
    Ok(resolve_next_page(&answer, current_url))
}

/// Turn a model answer into a followable absolute URL.
///
/// Rejected: zero confidence, empty or null-like candidates, non-http(s)
/// targets and the current page itself (fragments ignored).
#[must_use]
pub fn resolve_next_page(answer: &NextPage, current_url: &str) -> Option<String> {
    if answer.confidence == Some(0) {
        return None;
    }

    let candidate = answer.next_page_url.as_deref()?.trim();
    if candidate.is_empty()
        || candidate.eq_ignore_ascii_case("null")
        || candidate.eq_ignore_ascii_case("none")
        || candidate.starts_with('#')
    {
        return None;
    }

    let current = Url::parse(current_url).ok();
    let mut resolved = match &current {
        Some(base) => base.join(candidate).ok()?,
        None => Url::parse(candidate).ok()?,
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);

    if let Some(mut current) = current {
        current.set_fragment(None);
        if current == resolved {
            return None;
        }
    }
    Some(resolved.to_string())
}

/// Key under which a crawled URL is remembered: the parsed URL without
/// its fragment, or the trimmed input when it does not parse.
#[must_use]
pub fn visit_key(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}
