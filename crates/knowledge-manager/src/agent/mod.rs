//! LLM-driven agents: web crawling with pagination, run naming and
//! summarization.

mod naming;
mod pagination;
mod summarizer;
mod web;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub use naming::{dated_name, generate_title, random_slug, sanitize_folder_name, unique_dir};
pub use pagination::{find_next_page, resolve_next_page, NextPage};
pub use summarizer::{SummarizerAgent, SUMMARIES_DIR};
pub use web::{CrawlRun, WebCrawlerAgent};

/// Write `content` to `dir/file_name`, creating `dir` if needed.
pub(crate) fn write_artifact(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    std::fs::write(&path, content).map_err(|source| Error::FileWrite {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "Saved artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = write_artifact(&nested, "x.md", "hello").unwrap();
        assert_eq!(path, nested.join("x.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn test_write_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        let err = write_artifact(&file, "x.md", "hello").unwrap_err();
        assert!(matches!(err, Error::DirectoryCreate { .. }));
    }
}
