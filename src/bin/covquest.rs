//! Covquest CLI - coverage challenge engine for CI builds.
//!
//! The binary is a thin host around the library: it mines the repository,
//! evaluates the persisted challenge board against the current coverage
//! report, and tops the board up with freshly generated challenges.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use covquest::challenge::board::ChallengeBoard;
use covquest::challenge::context::{EvalContext, GenerationContext};
use covquest::challenge::factory;
use covquest::challenge::registry::ChallengeRegistry;
use covquest::core::config::CovquestConfig;
use covquest::coverage::artifacts::FileFacts;
use covquest::vcs::history::{self, HistoryMiner};
use covquest::vcs::identity::Identity;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Coverage challenge engine for CI builds
#[derive(Parser)]
#[command(name = "covquest")]
#[command(version = VERSION)]
#[command(about = "Covquest - coverage challenges from your commit history")]
#[command(long_about = "
Mine recent commit history, attribute changed files to contributors, and
maintain a per-contributor board of coverage challenges evaluated against
the coverage report of every build.

Common Usage:

  # Evaluate and refill the challenge board after a build
  covquest evaluate --identity 'u1:Ada Lovelace:ada@example.org'

  # Inspect what mining attributes to a contributor
  covquest mine --identity 'u1:Ada Lovelace:ada@example.org'

  # Print or check configuration
  covquest print-default-config
  covquest validate-config covquest.yml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the challenge board against the current build and refill it
    Evaluate(EvaluateArgs),

    /// Mine the commit history and print the attributed files
    Mine(MineArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Validate a covquest configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
struct EvaluateArgs {
    /// Workspace root holding the repository and report artifacts
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file; defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Challenge board file, created when missing
    #[arg(long, default_value = "covquest-board.json")]
    board: PathBuf,

    /// Contributor to evaluate, as "id:Display Name:email[:alias...]"
    #[arg(long, required = true)]
    identity: Vec<String>,

    /// Commit id mining stops at; defaults to the whole budgeted window
    #[arg(long, default_value = "")]
    until: String,

    /// Whether the triggering build failed
    #[arg(long)]
    build_failed: bool,

    /// Seed for deterministic challenge selection
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct MineArgs {
    /// Workspace root holding the repository
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file; defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Known contributor, as "id:Display Name:email[:alias...]"
    #[arg(long, required = true)]
    identity: Vec<String>,

    /// Commit id mining stops at
    #[arg(long, default_value = "")]
    until: String,
}

#[derive(Args)]
struct ValidateConfigArgs {
    /// Configuration file to validate
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Mine(args) => mine_command(args),
        Commands::PrintDefaultConfig => print_default_config(),
        Commands::ValidateConfig(args) => validate_config(args),
    }
}

fn evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_ref())?;
    let identities = parse_identities(&args.identity)?;
    let contributor = &identities[0];

    let miner = HistoryMiner::open(&args.workspace, config.mining.clone())
        .context("failed to open repository")?;
    let branch = miner.branch();
    let head = miner.head_id().context("failed to resolve HEAD")?;

    let records = miner.mine(&args.until, &identities);
    let candidates = candidate_facts(&records, &contributor.id, &args.workspace, &config)?;

    let mut board = if args.board.is_file() {
        ChallengeBoard::from_json_file(&args.board)
            .context("failed to load the challenge board")?
    } else {
        ChallengeBoard::new()
    };

    let eval_ctx = EvalContext {
        branch: branch.clone(),
        workspace: args.workspace.clone(),
        build_succeeded: !args.build_failed,
        config: &config,
        identities: &identities,
    };
    let outcome = board.evaluate(&eval_ctx);

    let generation_ctx = GenerationContext {
        config: &config,
        workspace: &args.workspace,
        branch: &branch,
        head_commit: &head,
        identity: contributor,
        candidates: &candidates,
    };
    let registry = ChallengeRegistry::new();
    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    factory::generate_build_challenge(&mut board, &generation_ctx, !args.build_failed);
    let added = factory::generate_new_challenges(&mut board, &generation_ctx, &registry, &mut rng)?;

    board
        .to_json_file(&args.board)
        .context("failed to persist the challenge board")?;

    println!(
        "solved {}, auto-rejected {}, generated {}, score {}",
        outcome.solved, outcome.unsolvable, added, board.score
    );
    for challenge in &board.current {
        println!("  [{}] {}", challenge.category(), challenge);
    }
    Ok(())
}

fn mine_command(args: MineArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_ref())?;
    let identities = parse_identities(&args.identity)?;

    let miner = HistoryMiner::open(&args.workspace, config.mining.clone())
        .context("failed to open repository")?;
    let records = miner.mine(&args.until, &identities);

    println!("{} changed files attributed on branch {}", records.len(), miner.branch());
    for record in &records {
        let authors: Vec<&str> = record.changed_by.iter().map(String::as_str).collect();
        println!(
            "  {:?} {} ({})",
            record.kind,
            record.path.display(),
            authors.join(", ")
        );
    }
    Ok(())
}

fn print_default_config() -> anyhow::Result<()> {
    let config = CovquestConfig::default();
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    CovquestConfig::from_yaml_file(&args.config)
        .with_context(|| format!("invalid configuration: {}", args.config.display()))?;
    println!("{} is valid", args.config.display());
    Ok(())
}

fn load_configuration(path: Option<&PathBuf>) -> anyhow::Result<CovquestConfig> {
    match path {
        Some(path) => CovquestConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(CovquestConfig::default()),
    }
}

/// Parse "id:Display Name:email[:alias...]" specs; the first one is the
/// contributor being evaluated.
fn parse_identities(specs: &[String]) -> anyhow::Result<Vec<Identity>> {
    let mut identities = Vec::with_capacity(specs.len());
    for spec in specs {
        let parts: Vec<&str> = spec.split(':').collect();
        if parts.len() < 3 {
            bail!("identity spec '{spec}' must be 'id:Display Name:email[:alias...]'");
        }
        let mut identity = Identity::new(parts[0], parts[1], parts[2]);
        for alias in &parts[3..] {
            identity = identity.with_alias(*alias);
        }
        identities.push(identity);
    }
    Ok(identities)
}

/// Coverage facts for the contributor's mined source files.
fn candidate_facts(
    records: &[history::ChangedFileRecord],
    identity_id: &str,
    workspace: &std::path::Path,
    config: &CovquestConfig,
) -> anyhow::Result<Vec<FileFacts>> {
    let mut facts = Vec::new();
    for record in history::source_records(records) {
        if !record.changed_by.contains(identity_id) {
            continue;
        }
        facts.push(FileFacts::from_record(record, workspace, &config.reports)?);
    }
    Ok(facts)
}
