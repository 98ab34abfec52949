//! `quicklaunch` - drive the ranking core from a terminal
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quicklaunch search "<query>"` | Print the ranked results for a query |
//! | `quicklaunch select "<query>" --index N` | Record and run the Nth result |
//! | `quicklaunch usage` | Show the most used identifiers |
//! | `quicklaunch clear-usage` | Forget all usage history |
//! | `quicklaunch repl` | Type queries interactively |

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use quicklaunch_core::candidate::InternalCommand;
use quicklaunch_core::config::{load_config, load_config_from, Config};
use quicklaunch_core::error::ResultExt;
use quicklaunch_core::{
    activate, logging, ActionOutcome, AppCatalog, CandidateAction, ProcessRunningApps,
    QueryDispatcher, RankedResults, SystemActionExecutor, UsageTracker,
};

#[derive(Parser)]
#[command(name = "quicklaunch", about = "Launcher search and ranking from the command line", version)]
struct Cli {
    /// Configuration file (defaults to ~/.quicklaunch/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print ranked results for a query
    Search {
        query: String,

        /// Emit the published round as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a selection and run its action
    Select {
        query: String,

        /// Position in the result list (0-based)
        #[arg(long, default_value_t = 0)]
        index: usize,

        /// Show what would run without recording or running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the highest usage scores
    Usage {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Forget all usage history
    ClearUsage,

    /// Read queries from stdin; `:N` runs result N of the last query
    Repl,
}

struct Launcher {
    dispatcher: QueryDispatcher,
    usage: Arc<UsageTracker>,
}

impl Launcher {
    fn new(config: &Config) -> Self {
        let catalog = Arc::new(AppCatalog::new(config.get_application_directories()));
        catalog.refresh();
        let usage = Arc::new(UsageTracker::open(&config.get_usage()));
        let dispatcher = QueryDispatcher::from_config(
            config,
            usage.clone(),
            catalog,
            Arc::new(ProcessRunningApps::new()),
        );
        Launcher { dispatcher, usage }
    }

    fn search(&self, query: &str) -> Result<RankedResults> {
        self.dispatcher
            .search(query)
            .context("Search was superseded by a newer query")
    }

    fn select(&self, results: &RankedResults, index: usize, dry_run: bool) -> Result<()> {
        let Some(item) = results.items.get(index) else {
            bail!("No result at index {} ({} results)", index, results.len());
        };
        let candidate = &item.candidate;

        if dry_run {
            println!("Would run {}: {:?}", candidate.id, candidate.action);
            return Ok(());
        }

        match activate(&self.dispatcher, &SystemActionExecutor, candidate)? {
            ActionOutcome::Opened { target } => println!("Opened {}", target),
            ActionOutcome::Delegated(action) => self.run_delegated(action)?,
        }
        Ok(())
    }

    /// Handle what a terminal can; report the rest
    fn run_delegated(&self, action: CandidateAction) -> Result<()> {
        match action {
            CandidateAction::CopyText { text } => println!("{}", text),
            CandidateAction::Internal {
                command: InternalCommand::ClearUsage,
            } => {
                self.usage.clear()?;
                self.dispatcher.clear_cache();
                println!("Usage history cleared");
            }
            other => println!("Needs the desktop host: {:?}", other),
        }
        Ok(())
    }
}

fn print_results(results: &RankedResults) {
    if results.is_empty() {
        println!("No results");
        return;
    }
    for (index, item) in results.items.iter().enumerate() {
        if index == results.ranked_len {
            println!("    --");
        }
        let candidate = &item.candidate;
        println!(
            "{:>3}. {}{}  [{} {:.3}]",
            index,
            candidate.title,
            if candidate.running { " (running)" } else { "" },
            candidate.kind.label(),
            item.score,
        );
        if !candidate.subtitle.is_empty() {
            println!("       {}", candidate.subtitle);
        }
    }
}

fn repl(launcher: &Launcher) -> Result<()> {
    let stdin = io::stdin();
    let mut last: Option<RankedResults> = None;

    print!("> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();

        if input == ":q" {
            break;
        }
        if let Some(index) = input.strip_prefix(':') {
            match (index.parse::<usize>(), last.as_ref()) {
                (Ok(index), Some(results)) => {
                    launcher.select(results, index, false).warn_on_err();
                }
                _ => println!("Usage: :N after a query, or :q to quit"),
            }
        } else {
            let results = launcher.search(input)?;
            print_results(&results);
            last = Some(results);
        }

        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };

    match cli.command {
        Commands::Search { query, json } => {
            let launcher = Launcher::new(&config);
            let results = launcher.search(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }
        Commands::Select {
            query,
            index,
            dry_run,
        } => {
            let launcher = Launcher::new(&config);
            let results = launcher.search(&query)?;
            launcher.select(&results, index, dry_run)?;
            launcher.usage.flush()?;
        }
        Commands::Usage { limit } => {
            let usage = UsageTracker::open(&config.get_usage());
            for (record, score) in usage.top(limit) {
                println!(
                    "{:>9.2}  {:>4}x  {}  (last used {})",
                    score,
                    record.count,
                    record.identifier,
                    record.last_used.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::ClearUsage => {
            let usage = UsageTracker::open(&config.get_usage());
            usage.clear()?;
            println!("Usage history cleared");
        }
        Commands::Repl => {
            let launcher = Launcher::new(&config);
            repl(&launcher)?;
            launcher.usage.flush().log_err();
        }
    }

    info!(event_type = "app_lifecycle", action = "stopped", "Exiting");
    Ok(())
}
