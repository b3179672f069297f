//! Web crawling agent.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info, warn};

use super::naming::{dated_name, generate_title, random_slug, unique_dir};
use super::pagination::{find_next_page, visit_key};
use super::write_artifact;
use crate::crawlers::PageFetcher;
use crate::entry::{Entry, SourceKind};
use crate::error::{Error, Result};
use crate::llm::{LanguageModel, Pacer};

/// Artifacts of one fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRun {
    /// Run directory (after renaming).
    pub run_dir: PathBuf,
    /// Markdown of every fetched page, in crawl order.
    pub pages: Vec<String>,
    /// URL of every fetched page.
    pub urls: Vec<String>,
    /// HTML title of every fetched page, when it had one.
    pub page_titles: Vec<Option<String>>,
    /// Saved page files.
    pub fetched_paths: Vec<PathBuf>,
    /// Sanitized title the run directory was named after.
    pub folder_title: String,
}

impl CrawlRun {
    /// One [`SourceKind::Web`] entry per fetched page.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        let origin = self.urls.first().cloned().unwrap_or_default();
        self.urls
            .iter()
            .zip(&self.page_titles)
            .map(|(url, title)| {
                let title = title
                    .clone()
                    .unwrap_or_else(|| self.folder_title.replace('_', " "));
                Entry::new(SourceKind::Web, origin.clone(), title, url.clone())
            })
            .collect()
    }
}

/// Fetches one page or a paginated sequence and organizes the artifacts.
#[derive(Debug, Clone)]
pub struct WebCrawlerAgent {
    fetcher: PageFetcher,
    model: Arc<dyn LanguageModel>,
    output_dir: PathBuf,
    max_pages: usize,
    pacer: Pacer,
}

impl WebCrawlerAgent {
    /// Create an agent writing runs under `output_dir`.
    #[must_use]
    pub fn new(
        fetcher: PageFetcher,
        model: Arc<dyn LanguageModel>,
        output_dir: impl Into<PathBuf>,
        max_pages: usize,
        pacer: Pacer,
    ) -> Self {
        Self {
            fetcher,
            model,
            output_dir: output_dir.into(),
            max_pages: max_pages.max(1),
            pacer,
        }
    }

    /// Fetch `start_url`, following pagination when `crawl` is set.
    ///
    /// The single-page mode saves `raw.md`; crawl mode saves
    /// `fetched/page_{i}.md`. The run directory is then renamed after an
    /// LLM-generated title.
    ///
    /// # Errors
    ///
    /// Returns an error if the run directory cannot be created, the first
    /// page cannot be fetched, or an artifact cannot be written.
    pub async fn fetch(&self, start_url: &str, crawl: bool) -> Result<CrawlRun> {
        let run_dir = self.create_run_dir()?;
        info!(run_dir = %run_dir.display(), "Created run directory");

        let mut pages = Vec::new();
        let mut urls = Vec::new();
        let mut page_titles = Vec::new();
        let mut fetched_paths = Vec::new();

        if crawl {
            info!(url = start_url, "Starting crawl");
            let fetched_dir = run_dir.join("fetched");
            let mut visited = HashSet::new();
            let mut url = visit_key(start_url);

            loop {
                let page = match self.fetcher.fetch_markdown(&url).await {
                    Ok(page) => page,
                    Err(e) if pages.is_empty() => return Err(e),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to fetch page, ending crawl");
                        break;
                    }
                };
                let index = pages.len() + 1;
                let path = write_artifact(&fetched_dir, &format!("page_{index}.md"), &page.markdown)?;
                fetched_paths.push(path);
                visited.insert(visit_key(&url));

                let next = if index >= self.max_pages {
                    info!(max_pages = self.max_pages, "Reached page limit, ending crawl");
                    None
                } else {
                    let next = find_next_page(self.model.as_ref(), &page.markdown, &url)
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "Next page detection failed, ending crawl");
                            None
                        });
                    self.pacer.pause().await;
                    next
                };

                pages.push(page.markdown);
                urls.push(page.url);
                page_titles.push(page.title);

                match next {
                    Some(next) if visited.contains(&visit_key(&next)) => {
                        info!(url = %next, "Next page already visited, ending crawl");
                        break;
                    }
                    Some(next) => url = next,
                    None => break,
                }
            }
        } else {
            info!(url = start_url, "Fetching single page");
            let page = self.fetcher.fetch_markdown(start_url).await?;
            fetched_paths.push(write_artifact(&run_dir, "raw.md", &page.markdown)?);
            pages.push(page.markdown);
            urls.push(page.url);
            page_titles.push(page.title);
        }

        let folder_title = generate_title(self.model.as_ref(), &pages, start_url).await;
        self.pacer.pause().await;
        info!(folder_title = %folder_title, "Generated folder title");

        let new_dir = rename_run_dir(&run_dir, &folder_title);
        let fetched_paths = if new_dir == run_dir {
            fetched_paths
        } else {
            info!(run_dir = %new_dir.display(), "Run directory renamed");
            fetched_paths
                .into_iter()
                .map(|p| rebase(&p, &run_dir, &new_dir))
                .collect()
        };

        Ok(CrawlRun {
            run_dir: new_dir,
            pages,
            urls,
            page_titles,
            fetched_paths,
            folder_title,
        })
    }

    fn create_run_dir(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| Error::DirectoryCreate {
            path: self.output_dir.clone(),
            source,
        })?;
        let run_dir = unique_dir(&self.output_dir, &format!("run_{}", random_slug(8)));
        std::fs::create_dir(&run_dir).map_err(|source| Error::DirectoryCreate {
            path: run_dir.clone(),
            source,
        })?;
        Ok(run_dir)
    }
}

/// Rename `run_dir` to `{title}_{date}` beside it; on failure keep `run_dir`.
fn rename_run_dir(run_dir: &Path, title: &str) -> PathBuf {
    let Some(parent) = run_dir.parent() else {
        return run_dir.to_path_buf();
    };
    let target = unique_dir(parent, &dated_name(title, Local::now().date_naive()));
    match std::fs::rename(run_dir, &target) {
        Ok(()) => target,
        Err(e) => {
            error!(
                error = %e,
                run_dir = %run_dir.display(),
                "Could not rename run directory, keeping original"
            );
            run_dir.to_path_buf()
        }
    }
}

fn rebase(path: &Path, from: &Path, to: &Path) -> PathBuf {
    path.strip_prefix(from)
        .map_or_else(|_| path.to_path_buf(), |rel| to.join(rel))
}
