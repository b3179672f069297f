//! `kman` - CLI for knowledge-manager
//!
//! This binary fetches feeds and papers into the local database, runs the
//! web crawler, summarizer and transcript agents, and offers a terminal chat.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use knowledge_manager::agent::{SummarizerAgent, WebCrawlerAgent};
use knowledge_manager::batch::read_batch_csv;
use knowledge_manager::chat::ChatBot;
use knowledge_manager::cli::{
    render_entries, render_insert_report, render_stats, Cli, Command, ConfigCommand,
    CrawlCommand, FetchCommand, OutputFormat, PruneCommand, RecentCommand, SearchCommand,
    TranscriptCommand,
};
use knowledge_manager::crawlers::{http_client, ArxivCrawler, PageFetcher, RssCrawler};
use knowledge_manager::filter::EntryFilter;
use knowledge_manager::llm::{GeminiClient, LanguageModel, Pacer};
use knowledge_manager::storage::load_json;
use knowledge_manager::transcript::{TimedTextSource, TranscriptPipeline};
use knowledge_manager::watch::{Retention, WatchHandle, Watcher};
use knowledge_manager::{init_logging, Config, Crawler, Entry, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // `config path` and `config validate` must work with a broken config file.
    if let Command::Config(cmd) = &cli.command {
        if !cmd.needs_loaded_config() {
            init_logging(cli.verbosity(), None);
            return handle_config(None, cli.config.as_deref(), cmd);
        }
    }

    let config = load_config(cli.config.as_deref())?;
    init_logging(cli.verbosity(), config.logging.file.as_deref());

    match cli.command {
        Command::Fetch(cmd) => handle_fetch(&config, cmd).await,
        Command::Crawl(cmd) => handle_crawl(&config, &cmd).await,
        Command::Transcript(cmd) => handle_transcript(&config, cmd).await,
        Command::Chat => handle_chat(&config).await,
        Command::Search(cmd) => handle_search(&config, &cmd),
        Command::Recent(cmd) => handle_recent(&config, &cmd),
        Command::Stats { json } => handle_stats(&config, json),
        Command::Prune(cmd) => handle_prune(&config, &cmd),
        Command::Export { file } => handle_export(&config, &file),
        Command::Import { file } => handle_import(&config, &file),
        Command::Watch { once } => handle_watch(&config, once).await,
        Command::Config(cmd) => handle_config(Some(&config), cli.config.as_deref(), &cmd),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load_from(path.map(Path::to_path_buf)).context("failed to load configuration")
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn language_model(config: &Config, model: &str) -> Result<Arc<dyn LanguageModel>> {
    let client = GeminiClient::from_config(&config.llm, config.api_key(), model)?;
    Ok(Arc::new(client))
}

/// Filter and store `entries`, printing what happened.
fn store_entries(storage: &Storage, filter: &EntryFilter, entries: Vec<Entry>) -> Result<()> {
    let (entries, blocked) = filter.apply(entries);
    let report = storage.insert_many(&entries)?;
    println!("{}", render_insert_report(&report, blocked));
    Ok(())
}

async fn handle_fetch(config: &Config, cmd: FetchCommand) -> Result<()> {
    let client = http_client(&config.crawl)?;
    let (crawler, json): (Box<dyn Crawler>, bool) = match cmd {
        FetchCommand::Rss { limit, feeds, json } => {
            let feeds = if feeds.is_empty() {
                config.feeds.rss_feeds.clone()
            } else {
                feeds
            };
            let limit = limit.unwrap_or(config.feeds.rss_limit);
            let crawler: Box<dyn Crawler> = Box::new(RssCrawler::new(client, feeds, limit));
            (crawler, json)
        }
        FetchCommand::Arxiv {
            queries,
            limit,
            json,
        } => {
            let queries = if queries.is_empty() {
                config.feeds.arxiv_queries.clone()
            } else {
                queries
            };
            let limit = limit.unwrap_or(config.feeds.arxiv_limit);
            let crawler: Box<dyn Crawler> = Box::new(ArxivCrawler::new(
                client,
                config.feeds.arxiv_base_url.clone(),
                queries,
                limit,
            ));
            (crawler, json)
        }
    };

    let entries = crawler
        .fetch()
        .await
        .with_context(|| format!("{} fetch failed", crawler.name()))?;

    let storage = open_storage(config)?;
    let filter = EntryFilter::new(&config.filter);
    let (entries, blocked) = filter.apply(entries);
    let report = storage.insert_many(&entries)?;

    if json {
        println!("{}", render_entries(&entries, OutputFormat::Json)?);
    } else {
        print!("{}", render_entries(&entries, OutputFormat::Plain)?);
        println!("{}", render_insert_report(&report, blocked));
    }
    Ok(())
}

async fn handle_crawl(config: &Config, cmd: &CrawlCommand) -> Result<()> {
    let pacer = Pacer::new(config.llm_call_delay());
    let agent = WebCrawlerAgent::new(
        PageFetcher::new(http_client(&config.crawl)?),
        language_model(config, &config.llm.model)?,
        &config.crawl.output_dir,
        config.crawl.max_pages,
        pacer,
    );

    let mut runs = Vec::new();
    if let Some(csv) = &cmd.csv {
        let rows = read_batch_csv(csv)?;
        info!(rows = rows.len(), "Processing batch");
        for row in rows {
            match agent.fetch(&row.url, row.crawl).await {
                Ok(run) => runs.push(run),
                Err(e) => error!(url = %row.url, error = %e, "Failed to process URL"),
            }
        }
    } else if let Some(url) = &cmd.url {
        runs.push(agent.fetch(url, cmd.crawl).await?);
    }

    if runs.is_empty() {
        warn!("Nothing was fetched");
        return Ok(());
    }

    let storage = open_storage(config)?;
    let filter = EntryFilter::new(&config.filter);
    for run in &runs {
        println!(
            "Fetched {} page(s) into {}",
            run.pages.len(),
            run.run_dir.display()
        );
        store_entries(&storage, &filter, run.entries())?;
    }

    let question = if runs.len() > 1 {
        "Do you want to summarize all fetched content?"
    } else {
        "Do you want to summarize the fetched content?"
    };
    let summarize = cmd
        .summary_choice()
        .resolve(question, &mut io::stdin().lock(), &mut io::stdout())?;
    if !summarize {
        return Ok(());
    }

    let summarizer = SummarizerAgent::new(language_model(config, &config.llm.summary_model)?, pacer);
    for run in &runs {
        match summarizer.summarize_run(run).await {
            Ok(path) => println!("Summary written to {}", path.display()),
            Err(e) => error!(run_dir = %run.run_dir.display(), error = %e, "Summarization failed"),
        }
    }
    Ok(())
}

async fn handle_transcript(config: &Config, cmd: TranscriptCommand) -> Result<()> {
    let source = Arc::new(TimedTextSource::new(
        http_client(&config.crawl)?,
        config.transcript.base_url.clone(),
        config.transcript.language.clone(),
    ));
    let base_dir = cmd
        .base_dir
        .unwrap_or_else(|| config.transcript.base_dir.clone());
    let pipeline = TranscriptPipeline::new(source, language_model(config, &config.llm.model)?, base_dir);

    let Some(artifacts) = pipeline.process(&cmd.url, cmd.force).await? else {
        println!("No transcript available for {}", cmd.url);
        return Ok(());
    };

    println!("Transcript artifacts in {}", artifacts.video_dir.display());
    if let Some(title) = &artifacts.title {
        println!("Title: {title}");
    }

    let storage = open_storage(config)?;
    store_entries(&storage, &EntryFilter::new(&config.filter), vec![artifacts.entry()])?;
    Ok(())
}

async fn handle_chat(config: &Config) -> Result<()> {
    let model = language_model(config, &config.llm.chat_model)?;
    let mut bot = ChatBot::new(model, &config.chat);
    bot.run_conversation(&mut io::stdin().lock(), &mut io::stdout())
        .await?;
    Ok(())
}

fn print_entries(entries: &[Entry], format: OutputFormat) -> Result<()> {
    if entries.is_empty() && format != OutputFormat::Json {
        println!("No entries found.");
    } else {
        print!("{}", render_entries(entries, format)?);
        if format == OutputFormat::Json {
            println!();
        }
    }
    Ok(())
}

fn handle_search(config: &Config, cmd: &SearchCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let entries = storage.search(&cmd.query, cmd.source.map(Into::into), cmd.limit)?;
    print_entries(&entries, cmd.format)
}

fn handle_recent(config: &Config, cmd: &RecentCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let entries = match cmd.source {
        Some(source) => storage.get_by_source(source.into(), cmd.limit)?,
        None => storage.get_recent(cmd.limit)?,
    };
    print_entries(&entries, cmd.format)
}

fn handle_stats(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;
    if json {
        println!("{}", render_stats(&stats, true)?);
    } else {
        println!("Database:      {}", storage.path().display());
        print!("{}", render_stats(&stats, false)?);
    }
    Ok(())
}

fn handle_prune(config: &Config, cmd: &PruneCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let deleted = if cmd.older_than_days.is_none() && cmd.keep.is_none() {
        Retention::from_config(config).apply(&storage)?
    } else {
        let mut deleted = 0;
        if let Some(days) = cmd.older_than_days {
            deleted += storage.prune_older_than(chrono::Duration::days(i64::from(days)))?;
        }
        if let Some(keep) = cmd.keep {
            deleted += storage.prune_keep_recent(keep)?;
        }
        deleted
    };
    println!("Pruned {deleted} entries");
    Ok(())
}

fn handle_export(config: &Config, file: &Path) -> Result<()> {
    let storage = open_storage(config)?;
    let count = storage.export_json(file)?;
    println!("Exported {count} entries to {}", file.display());
    Ok(())
}

fn handle_import(config: &Config, file: &Path) -> Result<()> {
    let entries = load_json(file).with_context(|| format!("failed to read {}", file.display()))?;
    let storage = open_storage(config)?;
    let report = storage.insert_many(&entries)?;
    println!(
        "Imported {} entries ({} already known)",
        report.inserted, report.duplicates
    );
    Ok(())
}

async fn handle_watch(config: &Config, once: bool) -> Result<()> {
    let client = http_client(&config.crawl)?;
    let crawlers: Vec<Box<dyn Crawler>> = vec![
        Box::new(RssCrawler::new(
            client.clone(),
            config.feeds.rss_feeds.clone(),
            config.feeds.rss_limit,
        )),
        Box::new(ArxivCrawler::new(
            client,
            config.feeds.arxiv_base_url.clone(),
            config.feeds.arxiv_queries.clone(),
            config.feeds.arxiv_limit,
        )),
    ];
    let watcher = Watcher::new(crawlers, config.watch_interval());
    let storage = open_storage(config)?;
    let filter = EntryFilter::new(&config.filter);

    if once {
        let report = watcher.run_cycle(&storage, &filter).await?;
        println!(
            "Fetched {}, stored {} new ({} already known, {} filtered)",
            report.fetched, report.inserted, report.duplicates, report.blocked
        );
        if !report.failed_crawlers.is_empty() {
            println!("Failed: {}", report.failed_crawlers.join(", "));
        }
        return Ok(());
    }

    watcher
        .run(
            &storage,
            &filter,
            &Retention::from_config(config),
            &WatchHandle::new(),
        )
        .await?;
    Ok(())
}

fn handle_config(
    loaded: Option<&Config>,
    config_path: Option<&Path>,
    cmd: &ConfigCommand,
) -> Result<()> {
    let config_file = || config_path.map_or_else(Config::default_config_path, Path::to_path_buf);
    match cmd {
        ConfigCommand::Show { json } => {
            let fresh;
            let config = match loaded {
                Some(config) => config,
                None => {
                    fresh = load_config(config_path)?;
                    &fresh
                }
            };
            if *json {
                let mut shown = config.clone();
                if shown.llm.api_key.is_some() {
                    shown.llm.api_key = Some("<redacted>".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print_config(config);
            }
        }
        ConfigCommand::Path => {
            println!("{}", config_file().display());
        }
        ConfigCommand::Validate { file } => {
            let path: PathBuf = file.clone().unwrap_or_else(config_file);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Storage]");
    println!("  Database path:      {}", config.database_path().display());
    println!("  Max entries:        {}", config.storage.max_entries);
    println!("  Max age (days):     {}", config.storage.max_age_days);
    println!();
    println!("[LLM]");
    println!("  Model:              {}", config.llm.model);
    println!("  Summary model:      {}", config.llm.summary_model);
    println!("  Chat model:         {}", config.llm.chat_model);
    println!(
        "  API key:            {}",
        if config.api_key().is_some() { "set" } else { "missing" }
    );
    println!();
    println!("[Feeds]");
    println!("  RSS feeds:          {}", config.feeds.rss_feeds.len());
    println!("  arXiv queries:      {}", config.feeds.arxiv_queries.join(", "));
    println!();
    println!("[Crawl]");
    println!("  Output dir:         {}", config.crawl.output_dir.display());
    println!("  Max pages:          {}", config.crawl.max_pages);
    println!();
    println!("[Transcript]");
    println!("  Base dir:           {}", config.transcript.base_dir.display());
    println!();
    println!("[Filter]");
    println!("  Enabled:            {}", config.filter.enabled);
    println!("  Exclude patterns:   {}", config.filter.exclude_patterns.len());
    println!("  Excluded domains:   {}", config.filter.excluded_domains.len());
}
