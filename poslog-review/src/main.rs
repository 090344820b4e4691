//! poslog-review - POS tag review tool
//!
//! Subcommands:
//! - `review`: interactive correction session over a review table
//! - `consensus`: precompute consensus and majority seeds from tagger outputs
//! - `stats`: agreement statistics of a review table

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use poslog_common::config::{
    resolve_bool, resolve_path, resolve_string, ConfigFileResolver, TomlConfig,
    DEFAULT_MANUAL_COLUMN, DEFAULT_TAGSET, MANUAL_COLUMN_ENV_VAR, OUTPUT_ENV_VAR,
    STRICT_UNSOLVED_ENV_VAR, TAGSET_ENV_VAR,
};
use poslog_common::events::{Direction, EventBus};
use poslog_review::consensus::{ConsensusStats, TagsetProfile};
use poslog_review::console::{self, Command};
use poslog_review::persistence::{
    build_store, precompute_consensus, ColumnNames, JsonLinesGateway, PersistenceGateway,
    StoreOptions,
};
use poslog_review::session::{Intent, NavigationMode, UnsolvedPolicy};
use poslog_review::{ReviewSession, SessionConfig, TagsetId};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Command-line arguments for poslog-review
#[derive(Parser, Debug)]
#[command(name = "poslog-review")]
#[command(about = "Reconcile POS tagger output and review disagreements")]
#[command(version)]
struct Cli {
    /// Config file (overrides POSLOG_CONFIG and the default location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive review session
    Review(ReviewArgs),
    /// Compute consensus records for a table of raw tagger outputs
    Consensus(ConsensusArgs),
    /// Print agreement statistics for a review table
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Review table (JSON Lines)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Save location; defaults to overwriting the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only absent tags count as unsolved
    #[arg(long)]
    strict: bool,

    /// Start from the majority vote instead of empty manual tags
    #[arg(long)]
    prefill_majority: bool,

    /// Session tagset (upos, ptb)
    #[arg(long)]
    tagset: Option<String>,

    /// Column holding the manual tags
    #[arg(long)]
    manual_column: Option<String>,
}

#[derive(Args, Debug)]
struct ConsensusArgs {
    /// Table with a `tagger_outputs` column
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the table with `consensus` and `majority` columns
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long)]
    tagset: Option<String>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long)]
    tagset: Option<String>,
}

fn resolve_tagset(cli: Option<String>, config: &TomlConfig) -> Result<TagsetId> {
    let name = resolve_string(cli, TAGSET_ENV_VAR, config.tagset.clone())
        .unwrap_or_else(|| DEFAULT_TAGSET.to_string());
    Ok(name.parse()?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolver = ConfigFileResolver::new(cli.config.clone());
    let config = resolver.load().context("Failed to load configuration")?;

    // Logs go to stderr; stdout belongs to the console view
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("poslog-review {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = resolver.resolve() {
        debug!("Config file: {}", path.display());
    }

    match cli.command {
        Commands::Review(args) => run_review(args, &config).await,
        Commands::Consensus(args) => run_consensus(args, &config),
        Commands::Stats(args) => run_stats(args, &config),
    }
}

fn run_consensus(args: ConsensusArgs, config: &TomlConfig) -> Result<()> {
    let tagset = resolve_tagset(args.tagset, config)?;
    let gateway = JsonLinesGateway::new(&args.input, Some(args.output));

    let mut table = gateway.load()?;
    let failures = precompute_consensus(
        &mut table,
        &ColumnNames::default(),
        &TagsetProfile::for_tagset(tagset),
    );
    let output = gateway.write_table(&table)?;

    info!(
        "Wrote consensus for {} rows to {} ({} failed)",
        table.len() - failures.len(),
        output.display(),
        failures.len()
    );
    Ok(())
}

fn run_stats(args: StatsArgs, config: &TomlConfig) -> Result<()> {
    let tagset = resolve_tagset(args.tagset, config)?;
    let table = JsonLinesGateway::new(&args.input, None).load()?;

    let options = StoreOptions {
        profile: TagsetProfile::for_tagset(tagset),
        ..Default::default()
    };
    let (store, failures) = build_store(&table, &options);
    let stats = ConsensusStats::from_records(store.iter().map(|item| &item.consensus));

    info!(
        lines = stats.lines.total,
        tokens = stats.tokens.total,
        skipped = failures.len(),
        "Computed agreement statistics"
    );
    println!("{}", stats);
    Ok(())
}

async fn run_review(args: ReviewArgs, config: &TomlConfig) -> Result<()> {
    let input = args
        .input
        .or_else(|| config.input.clone())
        .context("No review table given: pass --input or set `input` in config.toml")?;
    let output = resolve_path(args.output, OUTPUT_ENV_VAR, config.output.clone());
    let tagset = resolve_tagset(args.tagset, config)?;
    let strict = resolve_bool(
        args.strict.then_some(true),
        STRICT_UNSOLVED_ENV_VAR,
        config.strict_unsolved_mode,
        false,
    );
    let prefill_majority = args.prefill_majority || config.prefill_majority.unwrap_or(false);
    let manual_column = resolve_string(
        args.manual_column,
        MANUAL_COLUMN_ENV_VAR,
        config.manual_column.clone(),
    )
    .unwrap_or_else(|| DEFAULT_MANUAL_COLUMN.to_string());

    let session_config = SessionConfig {
        store: StoreOptions {
            columns: ColumnNames {
                manual: manual_column,
                ..Default::default()
            },
            profile: TagsetProfile::for_tagset(tagset),
            prefill_majority,
        },
        tagset,
        policy: UnsolvedPolicy::from_strict(strict),
    };

    let events = EventBus::default();
    spawn_event_logger(&events);

    let gateway = Box::new(JsonLinesGateway::new(input, output));
    let mut session = ReviewSession::open(gateway, session_config, events)
        .context("Failed to open review session")?;

    if !session.skipped_rows().is_empty() {
        println!(
            "Skipped {} rows without a usable consensus: {:?}",
            session.skipped_rows().len(),
            session.skipped_rows()
        );
    }

    // Start at the first item that needs attention
    let start = session.dispatch(Intent::Navigate {
        direction: Direction::Forward,
        mode: NavigationMode::Unsolved,
    })?;
    println!("{}", console::render_outcome(&start.outcome));
    print!("{}", console::render_view(&start.view));
    println!("Type h for help.");

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match console::parse_command(&line) {
            Err(e) => println!("{}", e),
            Ok(Command::Help) => println!("{}", console::HELP),
            Ok(Command::Show) => print!("{}", console::render_view(&session.view_state()?)),
            Ok(Command::Menu) => {
                println!("{}", console::render_menu(&session.vocabulary().menu()))
            }
            Ok(Command::Quit { force: false }) if session.has_unsaved_changes() => {
                println!("Unsaved changes: save with `s` or quit with `q!`");
            }
            Ok(Command::Quit { .. }) => {
                session.dispatch(Intent::EndSession)?;
            }
            Ok(Command::Intent(intent)) => match session.dispatch(intent) {
                Ok(response) => {
                    println!("{}", console::render_outcome(&response.outcome));
                    print!("{}", console::render_view(&response.view));
                }
                Err(e) => {
                    warn!("Command failed: {}", e);
                    println!("Error: {}", e);
                }
            },
        }

        if session.is_finished() {
            break;
        }
    }

    if !session.is_finished() {
        if session.has_unsaved_changes() {
            warn!("Input closed with unsaved changes");
        }
        session.end_session();
    }
    Ok(())
}

/// Log every review event as JSON at debug level
fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => debug!(target: "poslog_review::events", "{}", json),
                    Err(e) => warn!("Failed to serialize event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, {} events skipped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
