//! `knowledge-manager` - collect feeds, papers, web pages and transcripts
//!
//! This library provides the crawlers, LLM agents, transcript pipeline and
//! entry storage behind the `kman` command-line tool.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod agent;
pub mod batch;
pub mod chat;
pub mod cli;
pub mod config;
pub mod crawlers;
pub mod entry;
pub mod error;
pub mod filter;
pub mod llm;
pub mod logging;
pub mod markdown;
pub mod storage;
pub mod transcript;
pub mod watch;

pub use config::Config;
pub use entry::{Crawler, Entry, SourceKind};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{InsertReport, Storage, StorageStats};
