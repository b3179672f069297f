//! Run folder naming.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::crawlers::truncate_chars;
use crate::llm::prompts::{folder_title_prompt, FOLDER_TITLE_SYSTEM};
use crate::llm::{generate_structured, GenerateRequest, LanguageModel};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Longest folder title kept.
pub const MAX_TITLE_LEN: usize = 60;

/// Characters of the first page shown to the title prompt.
const TITLE_SAMPLE_CHARS: usize = 4000;

/// Random ASCII-letter slug.
#[must_use]
pub fn random_slug(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
        .collect()
}

/// Reduce `name` to letters and single underscores, at most 60 characters.
///
/// A name with nothing left becomes a random 6-letter slug.
#[must_use]
pub fn sanitize_folder_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphabetic() { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return random_slug(6);
    }
    trimmed.chars().take(MAX_TITLE_LEN).collect()
}

#[derive(Debug, Deserialize)]
struct FolderTitle {
    folder_title: String,
}

/// Ask `model` for a short folder title describing `pages`.
///
/// Never fails: when the model call fails a random 10-letter slug is used.
pub async fn generate_title(model: &dyn LanguageModel, pages: &[String], first_url: &str) -> String {
    let sample = pages
        .first()
        .map(|p| truncate_chars(p, TITLE_SAMPLE_CHARS))
        .unwrap_or_default();
    let request = GenerateRequest::new(FOLDER_TITLE_SYSTEM, folder_title_prompt(first_url, &sample));
    let schema = json!({
        "type": "OBJECT",
        "properties": {"folder_title": {"type": "STRING"}},
        "required": ["folder_title"]
    });

    let raw = match generate_structured::<FolderTitle>(model, request, schema).await {
        Ok(title) => title.folder_title,
        Err(e) => {
            error!(error = %e, "Title generation failed, falling back to slug");
            random_slug(10)
        }
    };
    sanitize_folder_name(&raw)
}

/// `{title}_{YYYY_MM_DD}`, unless the title already ends with that date.
#[must_use]
pub fn dated_name(title: &str, date: NaiveDate) -> String {
    let stamp = date.format("%Y_%m_%d").to_string();
    if title.ends_with(&stamp) {
        title.to_string()
    } else {
        format!("{title}_{stamp}")
    }
}

/// First of `parent/base`, `parent/base_1`, `parent/base_2`, ... that does not exist.
#[must_use]
pub fn unique_dir(parent: &Path, base: &str) -> PathBuf {
    let mut target = parent.join(base);
    let mut suffix = 1;
    while target.exists() {
        target = parent.join(format!("{base}_{suffix}"));
        suffix += 1;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    #[test]
    fn test_random_slug() {
        let slug = random_slug(8);
        assert_eq!(slug.len(), 8);
        assert!(slug.chars().all(|c| c.is_ascii_alphabetic()));
        assert!(random_slug(0).is_empty());
    }

    #[test]
    fn test_sanitize_folder_name() {
        assert_eq!(sanitize_folder_name("Rust Async Book"), "Rust_Async_Book");
        assert_eq!(sanitize_folder_name("  LLM: agents & tools! "), "LLM_agents_tools");
        assert_eq!(sanitize_folder_name("Part 2 of 3"), "Part_of");
        assert_eq!(sanitize_folder_name("__a__b__"), "a_b");
        assert_eq!(sanitize_folder_name("Café crème"), "Caf_cr_me");
    }

    #[test]
    fn test_sanitize_empty_falls_back_to_slug() {
        let name = sanitize_folder_name("1234 !!");
        assert_eq!(name.len(), 6);
        assert!(name.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_folder_name(&long).len(), MAX_TITLE_LEN);
    }

    #[test]
    fn test_dated_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(dated_name("Rust_Book", date), "Rust_Book_2024_03_09");
        assert_eq!(dated_name("Rust_Book_2024_03_09", date), "Rust_Book_2024_03_09");
    }

    #[test]
    fn test_unique_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_dir(dir.path(), "run"), dir.path().join("run"));

        std::fs::create_dir(dir.path().join("run")).unwrap();
        assert_eq!(unique_dir(dir.path(), "run"), dir.path().join("run_1"));

        std::fs::create_dir(dir.path().join("run_1")).unwrap();
        assert_eq!(unique_dir(dir.path(), "run"), dir.path().join("run_2"));
    }

    #[tokio::test]
    async fn test_generate_title() {
        let model = ScriptedModel::new([r#"{"folder_title": "Attention Is All You Need"}"#]);
        let pages = vec!["x".repeat(5000)];
        let title = generate_title(&model, &pages, "https://example.com").await;
        assert_eq!(title, "Attention_Is_All_You_Need");

        let prompt = &model.requests()[0].messages[0].text;
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
    }

    #[tokio::test]
    async fn test_generate_title_fallback() {
        let model = ScriptedModel::default();
        model.push_error("quota");
        let title = generate_title(&model, &[], "https://example.com").await;
        assert_eq!(title.len(), 10);
        assert!(title.chars().all(|c| c.is_ascii_alphabetic()));
    }
}
