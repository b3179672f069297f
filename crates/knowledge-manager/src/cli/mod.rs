//! Command-line interface for knowledge-manager.
//!
//! This module provides the CLI structure and output rendering for the
//! `kman` binary.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, CrawlCommand, FetchCommand, OutputFormat, PruneCommand, RecentCommand,
    SearchCommand, SourceArg, TranscriptCommand,
};
pub use output::{render_entries, render_insert_report, render_stats};

/// kman - Collect feeds, papers, web pages and transcripts
///
/// Fetches articles and papers into a local database, crawls and
/// summarizes web pages, and processes video transcripts with an LLM.
#[derive(Debug, Parser)]
#[command(name = "kman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch entries from feeds or arXiv and store them
    #[command(subcommand)]
    Fetch(FetchCommand),

    /// Fetch a web page (or a CSV batch), optionally crawling and summarizing
    Crawl(CrawlCommand),

    /// Fetch, correct and summarize a video transcript
    Transcript(TranscriptCommand),

    /// Chat with the assistant in the terminal
    Chat,

    /// Search stored entries
    Search(SearchCommand),

    /// Show recently stored entries
    Recent(RecentCommand),

    /// Show storage statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete old entries
    Prune(PruneCommand),

    /// Write all stored entries to a JSON file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Load entries from a JSON file written by `export`
    Import {
        /// Source file
        file: PathBuf,
    },

    /// Poll feeds and arXiv on an interval
    Watch {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
