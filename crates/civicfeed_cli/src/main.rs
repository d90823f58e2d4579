//! CLI entry point for CivicFeed.
//!
//! # Responsibility
//! - Provide a smoke probe for `civicfeed_core` linkage.
//! - Expose seed/shuffle/fetch/contact flows for local inspection.
//! - Keep output deterministic and line-oriented for scripting.

use civicfeed_core::{
    compute_seed, init_logging, resolve_level, shuffle, CacheStore, ContactDirectory, FeedConfig,
    FeedService, FetchOutcome, HttpPageSource, SqliteCacheStore,
};
use clap::{Parser, Subcommand};
use log::info;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "civicfeed")]
#[command(about = "CivicFeed paging and feed-shuffle tools")]
#[command(version)]
struct Cli {
    /// Absolute directory for rolling log files; logging is off when absent.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// One of trace|debug|info|warn|error.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the shuffle seed derived from the given titles.
    Seed {
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// Print titles (one per line) in shuffled order.
    Shuffle {
        /// Read titles from a file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Walk a paged endpoint and print `identity<TAB>title` lines.
    Fetch {
        #[arg(long)]
        config: PathBuf,
        /// Maximum number of pages to request.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
        /// Print items in deterministic shuffled order.
        #[arg(long, default_value_t = false)]
        shuffle: bool,
    },
    /// Look up a member's contact email from a CSV directory.
    Contact {
        #[arg(long)]
        csv: PathBuf,
        /// SQLite cache file to publish the directory into.
        #[arg(long)]
        cache: Option<PathBuf>,
        member_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let Some(command) = cli.command else {
        println!("civicfeed_core ping={}", civicfeed_core::ping());
        println!("civicfeed_core version={}", civicfeed_core::core_version());
        return Ok(());
    };

    match command {
        Command::Seed { titles } => {
            setup_logging(&cli.log_dir, cli.log_level.as_deref())?;
            println!("{}", compute_seed(&titles));
            Ok(())
        }
        Command::Shuffle { file } => {
            setup_logging(&cli.log_dir, cli.log_level.as_deref())?;
            let text = read_input(file)?;
            let titles = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>();
            for title in shuffle(titles) {
                println!("{title}");
            }
            Ok(())
        }
        Command::Fetch {
            config,
            pages,
            shuffle,
        } => {
            let config = FeedConfig::load(&config).map_err(|err| err.to_string())?;
            let level = cli.log_level.as_deref().or(config.log_level.as_deref());
            setup_logging(&cli.log_dir, level)?;
            fetch(config, pages, shuffle).await
        }
        Command::Contact {
            csv,
            cache,
            member_id,
        } => {
            setup_logging(&cli.log_dir, cli.log_level.as_deref())?;
            contact(csv, cache, &member_id)
        }
    }
}

async fn fetch(config: FeedConfig, pages: u32, shuffled: bool) -> Result<(), String> {
    let source = HttpPageSource::new(config.endpoint);
    let service = FeedService::new(source, config.page_limit).map_err(|err| err.to_string())?;

    service.refresh().await.map_err(|err| err.to_string())?;
    for _ in 1..pages {
        let outcome = service.load_more().await.map_err(|err| err.to_string())?;
        if matches!(outcome, FetchOutcome::Skipped(_)) {
            break;
        }
    }

    let snapshot = service.snapshot();
    info!(
        "event=cli_fetch module=cli status=ok items={} offset={} can_load_more={}",
        snapshot.items.len(),
        snapshot.offset,
        snapshot.can_load_more
    );

    let items = if shuffled {
        shuffle(snapshot.items)
    } else {
        snapshot.items
    };
    for item in items {
        println!("{}\t{}", item.identity, item.title);
    }
    if snapshot.can_load_more {
        eprintln!("more pages available after offset {}", snapshot.offset);
    }
    Ok(())
}

fn contact(csv: PathBuf, cache: Option<PathBuf>, member_id: &str) -> Result<(), String> {
    let text = std::fs::read_to_string(&csv)
        .map_err(|err| format!("failed to read `{}`: {err}", csv.display()))?;
    let directory = ContactDirectory::from_csv(&text).map_err(|err| err.to_string())?;

    if let Some(path) = cache {
        let store = SqliteCacheStore::open(&path).map_err(|err| err.to_string())?;
        store
            .clear_namespace("contact")
            .map_err(|err| err.to_string())?;
        directory
            .load_into(&store)
            .map_err(|err| err.to_string())?;
    }

    match directory.lookup(member_id) {
        Some(email) => {
            println!("{email}");
            Ok(())
        }
        None => Err(format!("no contact email for member `{}`", member_id.trim())),
    }
}

fn setup_logging(log_dir: &Option<PathBuf>, level: Option<&str>) -> Result<(), String> {
    let Some(log_dir) = log_dir else {
        return Ok(());
    };
    let level = resolve_level(level)?;
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", log_dir.display()))?;
    init_logging(level, log_dir)
}

fn read_input(file: Option<PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|err| format!("failed to read `{}`: {err}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("failed to read stdin: {err}"))?;
            Ok(text)
        }
    }
}
