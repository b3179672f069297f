//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand, ValueEnum};

use crate::batch::SummaryChoice;
use crate::entry::SourceKind;

/// Feed fetching commands.
#[derive(Debug, Subcommand)]
pub enum FetchCommand {
    /// Fetch the latest articles from RSS/Atom feeds
    Rss {
        /// Articles to take per feed (defaults to feeds.rss_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Feed URL; repeat to fetch several (defaults to feeds.rss_feeds)
        #[arg(long = "feed", value_name = "URL")]
        feeds: Vec<String>,

        /// Print fetched entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the latest papers from the arXiv API
    Arxiv {
        /// Search query; repeat for several (defaults to feeds.arxiv_queries)
        #[arg(long = "query", value_name = "QUERY")]
        queries: Vec<String>,

        /// Results per query (defaults to feeds.arxiv_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print fetched entries as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Crawl command arguments.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("input").required(true).args(["url", "csv"])))]
pub struct CrawlCommand {
    /// Page to fetch
    #[arg(long)]
    pub url: Option<String>,

    /// Batch file with `url;crawl` rows
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Follow pagination from the start page
    #[arg(long)]
    pub crawl: bool,

    /// Summarize without asking
    #[arg(long, conflicts_with = "no_summary")]
    pub summary: bool,

    /// Skip summarization without asking
    #[arg(long)]
    pub no_summary: bool,
}

impl CrawlCommand {
    /// The summarization choice given by the flags.
    #[must_use]
    pub fn summary_choice(&self) -> SummaryChoice {
        SummaryChoice::from_flags(self.summary, self.no_summary)
    }
}

/// Transcript command arguments.
#[derive(Debug, Args)]
pub struct TranscriptCommand {
    /// Video URL
    #[arg(long)]
    pub url: String,

    /// Redo every step even when its output exists
    #[arg(short, long)]
    pub force: bool,

    /// Directory for transcript artifacts (defaults to transcript.base_dir)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in titles and summaries
    pub query: String,

    /// Only entries from this source
    #[arg(short, long, value_enum)]
    pub source: Option<SourceArg>,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Recent command arguments.
#[derive(Debug, Args)]
pub struct RecentCommand {
    /// Number of entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Only entries from this source
    #[arg(short, long, value_enum)]
    pub source: Option<SourceArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Prune command arguments. Without limits, the configured retention applies.
#[derive(Debug, Args)]
pub struct PruneCommand {
    /// Delete entries fetched more than this many days ago
    #[arg(long, value_name = "DAYS")]
    pub older_than_days: Option<u32>,

    /// Keep only this many most recent entries
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

impl ConfigCommand {
    /// Whether the command reads the loaded configuration. `path` and
    /// `validate` run without it so a broken config file can be diagnosed.
    #[must_use]
    pub fn needs_loaded_config(&self) -> bool {
        matches!(self, Self::Show { .. })
    }
}

/// Entry source argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// RSS/Atom articles
    Rss,
    /// arXiv papers
    Arxiv,
    /// Crawled web pages
    Web,
    /// Video transcripts
    Transcript,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Rss => Self::Rss,
            SourceArg::Arxiv => Self::Arxiv,
            SourceArg::Web => Self::Web,
            SourceArg::Transcript => Self::Transcript,
        }
    }
}

/// Output format for entry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_arg_conversion() {
        assert_eq!(SourceKind::from(SourceArg::Rss), SourceKind::Rss);
        assert_eq!(SourceKind::from(SourceArg::Arxiv), SourceKind::Arxiv);
        assert_eq!(SourceKind::from(SourceArg::Web), SourceKind::Web);
        assert_eq!(
            SourceKind::from(SourceArg::Transcript),
            SourceKind::Transcript
        );
    }

    #[test]
    fn test_config_commands_needing_config() {
        assert!(ConfigCommand::Show { json: false }.needs_loaded_config());
        assert!(!ConfigCommand::Path.needs_loaded_config());
        assert!(!ConfigCommand::Validate { file: None }.needs_loaded_config());
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_summary_choice_from_flags() {
        let mut cmd = CrawlCommand {
            url: Some("https://example.com".to_string()),
            csv: None,
            crawl: false,
            summary: false,
            no_summary: false,
        };
        assert_eq!(cmd.summary_choice(), SummaryChoice::Ask);

        cmd.summary = true;
        assert_eq!(cmd.summary_choice(), SummaryChoice::Always);

        cmd.summary = false;
        cmd.no_summary = true;
        assert_eq!(cmd.summary_choice(), SummaryChoice::Never);
    }
}
