use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use intervals_dedup::client::{ActivitySource, IntervalsClient};
use intervals_dedup::config::{Config, ConfigError, resolve_config_path};
use intervals_dedup::dump::{fetch_all_details, write_dump};
use intervals_dedup::engine::cluster::{Cluster, build_clusters, sort_by_start};
use intervals_dedup::engine::models::ActivitySummary;
use intervals_dedup::engine::resolve::Resolver;
use intervals_dedup::engine::scoring::ScoringEngine;
use intervals_dedup::history::HistoryLog;
use intervals_dedup::runner::{AutoApprove, Mode, Prompter, RunSummary, Runner, TerminalPrompter};
use intervals_dedup::window::DateWindow;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "intervals-dedup",
    version,
    about = "Find and remove duplicate Intervals.icu activities"
)]
struct Cli {
    /// Config file (default: ./config.yml, then the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging and a listing of every scanned activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report duplicate groups and which activity would be kept
    Scan {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Adopt names and metadata onto winners and delete duplicates
    Clean {
        #[command(flatten)]
        window: WindowArgs,
        /// Only show what would change
        #[arg(long)]
        dry_run: bool,
        /// Confirm each change manually
        #[arg(long)]
        interactive: bool,
    },

    /// Export every activity's details to a JSON file
    Dump {
        #[command(flatten)]
        window: WindowArgs,
        /// File to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Work with the action history
    History {
        #[command(subcommand)]
        command: HistoryCmd,
    },
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Number of days to scan (overrides `days_to_sync`)
    #[arg(long)]
    days: Option<u32>,
    /// First day to scan
    #[arg(long, value_name = "YYYY-MM-DD")]
    start: Option<NaiveDate>,
    /// Last day to scan, inclusive
    #[arg(long, value_name = "YYYY-MM-DD", requires = "start")]
    end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
enum HistoryCmd {
    /// List recorded actions
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Scan { window } => dedupe(&config_path, cli.verbose, &window, Mode::Report, false),

        Commands::Clean {
            window,
            dry_run,
            interactive,
        } => dedupe(
            &config_path,
            cli.verbose,
            &window,
            Mode::Apply { dry_run },
            interactive,
        ),

        Commands::Dump { window, output } => {
            let config = load_config(&config_path)?;
            let client = IntervalsClient::new(&config.api_key, &config.athlete_id);
            let activities = list_activities(&client, &config, &window, cli.verbose)?;

            println!(
                "📦 Fetching details for {} activities and saving to {}...",
                activities.len(),
                output.display()
            );
            let details = fetch_all_details(&client, &activities)?;
            write_dump(&output, &details)?;
            println!("✅ Wrote {} activities to {}", details.len(), output.display());
            Ok(())
        }

        Commands::History {
            command: HistoryCmd::List,
        } => list_history(&config_path),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> Result<Config> {
    debug!(path = %path.display(), "loading config");
    Config::load(path).with_context(|| format!("Error loading config {}", path.display()))
}

fn list_activities<S: ActivitySource>(
    source: &S,
    config: &Config,
    window: &WindowArgs,
    verbose: bool,
) -> Result<Vec<ActivitySummary>> {
    let days = window.days.filter(|d| *d > 0).unwrap_or_else(|| config.days_to_sync());
    let range = DateWindow::resolve(window.start, window.end, days, Local::now().date_naive())?;

    println!(
        "🔍 Scanning for duplicates from {} to {}...",
        range.oldest, range.newest
    );
    let activities = source
        .list_activities(range.oldest, range.newest)
        .context("Error fetching activities")?;

    if verbose {
        println!("📊 Scanned {} total activities", activities.len());
        for a in &activities {
            let started = a
                .start_date_local
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            println!("   - [{}] {} ({})", a.id, a.name, started);
        }
    }
    Ok(activities)
}

fn dedupe(
    config_path: &Path,
    verbose: bool,
    window: &WindowArgs,
    mode: Mode,
    interactive: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let client = IntervalsClient::new(&config.api_key, &config.athlete_id);
    let mut activities = list_activities(&client, &config, window, verbose)?;

    sort_by_start(&mut activities);
    let clusters = build_clusters(&activities);
    if clusters.is_empty() {
        println!("No duplicates found.");
        return Ok(());
    }
    println!("Found {} duplicate group(s).", clusters.len());

    let engine = ScoringEngine::new(config.scoring.clone());
    let history = HistoryLog::new(config.history_path());
    let summary = if interactive {
        run(&client, &engine, &TerminalPrompter, mode, &history, clusters)?
    } else {
        run(&client, &engine, &AutoApprove, mode, &history, clusters)?
    };

    match mode {
        Mode::Report => println!(
            "\n📋 {} group(s) reviewed, {} kept because of size differences. Run `clean` to apply.",
            summary.clusters, summary.kept_mismatched
        ),
        Mode::Apply { dry_run: true } => {
            println!("\n⚠️  Dry-run only; no activities were changed.")
        }
        Mode::Apply { dry_run: false } => {
            println!(
                "\n✅ Deleted {}, renamed {}, merged metadata into {} ({} failure(s)). History in {}",
                summary.deleted,
                summary.renamed,
                summary.merged,
                summary.failures,
                history.path().display()
            );
        }
    }
    Ok(())
}

fn run<S: ActivitySource, P: Prompter>(
    source: &S,
    engine: &ScoringEngine,
    prompter: &P,
    mode: Mode,
    history: &HistoryLog,
    clusters: Vec<Cluster>,
) -> Result<RunSummary> {
    Runner::new(source, Resolver::new(engine), prompter, mode)
        .with_history(history)
        .run(clusters)
}

fn list_history(config_path: &Path) -> Result<()> {
    // Credentials are not needed to read local history
    let history_path = match Config::read(config_path) {
        Ok(config) => config.history_path(),
        Err(ConfigError::NotFound(path)) => {
            debug!(path = %path.display(), "no config file; using default history location");
            Config::default().history_path()
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Error loading config {}", config_path.display()));
        }
    };
    let history = HistoryLog::new(history_path);

    let records = history.read()?;
    if records.is_empty() {
        println!("No history recorded in {}", history.path().display());
        return Ok(());
    }

    println!("🗂️  Dedup History:");
    for (i, record) in records.into_iter().enumerate() {
        match record {
            Ok(rec) => {
                println!(
                    "[{}] {}\n     kept: {}\n     deleted: {:?}",
                    i, rec.timestamp, rec.retained, rec.deleted
                );
                if let Some(name) = &rec.renamed {
                    println!("     renamed: {name}");
                }
                if let Some(metadata) = &rec.metadata {
                    println!("     metadata: {metadata}");
                }
                println!("     action: {}\n", rec.action);
            }
            Err(err) => eprintln!("⚠️  Skipping malformed entry {}: {}", i, err),
        }
    }
    Ok(())
}
