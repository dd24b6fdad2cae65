//! `sharecycle`: list and add catalog records, run a matching pass.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use sharecycle_ai::{GeminiScorer, KeywordScorer, Scorer, ScoringConfig};
use sharecycle_core::{ItemCategory, ItemCondition, NewDonation, NewRequest};
use sharecycle_host::{MatchingHost, PassConfig};
use sharecycle_store::{CatalogRepository, DonationFilter, JsonStore, MemoryStore};
use tracing_subscriber::EnvFilter;

mod display;

#[derive(Parser)]
#[command(name = "sharecycle")]
#[command(about = "Match donated items with requests for them")]
#[command(version)]
struct Cli {
    /// Catalog file; the built-in demo catalog is used when omitted
    #[arg(long, global = true, env = "SHARECYCLE_DATA")]
    data: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List donations, newest first
    Donations(BrowseArgs),

    /// List requests, newest first
    Requests,

    /// List a donated item
    Donate(DonateArgs),

    /// Ask for an item
    Request(RequestArgs),

    /// Load the demo catalog into an empty catalog file
    Seed,

    /// Run one matching pass and show the results
    Match(MatchArgs),
}

#[derive(Args)]
struct BrowseArgs {
    /// Only this category
    #[arg(long)]
    category: Option<ItemCategory>,
    /// Case-insensitive text to look for in descriptions
    #[arg(long, default_value = "")]
    search: String,
}

#[derive(Args)]
struct DonateArgs {
    #[arg(long)]
    category: ItemCategory,
    #[arg(long)]
    description: String,
    #[arg(long, default_value = "Good")]
    condition: ItemCondition,
    /// Image URL or data URL (inline images up to 2 MB)
    #[arg(long)]
    photo: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    location: String,
}

#[derive(Args)]
struct RequestArgs {
    #[arg(long)]
    category: ItemCategory,
    /// What is needed and why
    #[arg(long)]
    description: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    location: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScorerKind {
    /// Offline category and keyword overlap
    Keyword,
    /// Hosted Gemini model
    Gemini,
}

#[derive(Args)]
struct MatchArgs {
    #[arg(long, value_enum, default_value_t = ScorerKind::Keyword)]
    scorer: ScorerKind,

    /// Gemini model name
    #[arg(long, default_value = sharecycle_ai::DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the Gemini endpoint (e.g. a local proxy)
    #[arg(long, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    /// Give up on the scorer after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Print the summary and results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::info!("sharecycle v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Seed => cmd_seed(cli.data.as_deref()),
        Command::Donations(args) => {
            let repo = open_repo(cli.data.as_deref())?;
            let filter = DonationFilter::new(args.category, args.search);
            let donations = repo.find_donations(&filter)?;
            if donations.is_empty() {
                println!("No donations found.");
            }
            donations.iter().for_each(display::print_donation_card);
            Ok(())
        }
        Command::Requests => {
            let repo = open_repo(cli.data.as_deref())?;
            let requests = repo.list_requests()?;
            if requests.is_empty() {
                println!("No open requests.");
            }
            requests.iter().for_each(display::print_request_card);
            Ok(())
        }
        Command::Donate(args) => {
            let repo = open_repo(cli.data.as_deref())?;
            let donation = repo
                .add_donation(NewDonation {
                    category: args.category,
                    description: args.description,
                    condition: args.condition,
                    photo: args.photo,
                    donor_name: args.name,
                    donor_email: args.email,
                    donor_phone: args.phone,
                    donor_location: args.location,
                })
                .context("donation rejected")?;
            warn_if_ephemeral(cli.data.as_deref());
            display::print_donation_card(&donation);
            Ok(())
        }
        Command::Request(args) => {
            let repo = open_repo(cli.data.as_deref())?;
            let request = repo
                .add_request(NewRequest {
                    category: args.category,
                    description: args.description,
                    requester_name: args.name,
                    requester_email: args.email,
                    requester_phone: args.phone,
                    requester_location: args.location,
                })
                .context("request rejected")?;
            warn_if_ephemeral(cli.data.as_deref());
            display::print_request_card(&request);
            Ok(())
        }
        Command::Match(args) => {
            let repo = open_repo(cli.data.as_deref())?;
            cmd_match(repo, args).await
        }
    }
}

fn open_repo(data: Option<&Path>) -> Result<Arc<dyn CatalogRepository>> {
    match data {
        Some(path) => {
            let store = JsonStore::open_persistent(path)
                .with_context(|| format!("opening catalog {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::seeded())),
    }
}

fn warn_if_ephemeral(data: Option<&Path>) {
    if data.is_none() {
        eprintln!("note: no --data file given; this record is not saved");
    }
}

fn cmd_seed(data: Option<&Path>) -> Result<()> {
    let Some(path) = data else {
        bail!("seed needs a catalog file (--data or SHARECYCLE_DATA)");
    };
    let store = JsonStore::open_persistent(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    if store.seed_if_empty()? {
        println!("Seeded demo catalog into {}", path.display());
    } else {
        println!("{} already holds records; left unchanged", path.display());
    }
    Ok(())
}

async fn cmd_match(repo: Arc<dyn CatalogRepository>, args: MatchArgs) -> Result<()> {
    let timeout = Duration::from_secs(args.timeout_secs);
    let scorer: Arc<dyn Scorer> = match args.scorer {
        ScorerKind::Keyword => Arc::new(KeywordScorer::new()),
        ScorerKind::Gemini => {
            let mut config = ScoringConfig::default()
                .with_model(args.model)
                .with_timeout(timeout);
            if let Some(key) = args.api_key {
                config = config.with_api_key(key);
            }
            if let Some(url) = args.base_url {
                config = config.with_base_url(url);
            }
            Arc::new(GeminiScorer::new(config).context("building Gemini client")?)
        }
    };

    let host = MatchingHost::new(repo, scorer, PassConfig { timeout });
    let outcome = host
        .run_pass()
        .await
        .with_context(|| format!("matching with the {} scorer", host.scorer_name()))?;

    if args.json {
        let out = json!({
            "summary": outcome.summary,
            "results": outcome.results,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    display::print_summary(&outcome.summary);
    for result in &outcome.results {
        display::print_match_card(result, &outcome.snapshot);
    }
    Ok(())
}
