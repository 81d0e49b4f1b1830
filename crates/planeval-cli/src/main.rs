//! Planeval - plan-probing equivalence evaluation for generated PDDL domains.
//!
//! ## Commands
//!
//! - `index`: parse and persist the reference domain/problem index
//! - `plans`: plan and validate the reference plan cache
//! - `probe`: classify a single candidate domain file
//! - `annotate`: attach metrics to a parsed-outputs batch

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use planeval_core::{init_tracing, DomainProber, MetricDriver};
use planeval_model::batch::TaskRecord;
use planeval_store::{KnowledgeStore, PlanStore};
use planeval_tools::{
    KstarPlanner, Planner, PlannerConfig, ValValidator, Validator, ValidatorConfig,
};

#[derive(Parser)]
#[command(name = "planeval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heuristic equivalence evaluation for generated planning domains", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the reference corpus and the persisted caches live.
#[derive(Args, Debug, Clone)]
struct CorpusArgs {
    /// Directory holding the reference PDDL domain and problem files
    #[arg(long, default_value = "data/pddlData/pddl-problems")]
    problems: PathBuf,

    /// Directory holding the per-domain predicate description files
    #[arg(long, default_value = "data/pddlData/predicate-descriptions")]
    predicate_descriptions: PathBuf,

    /// Persisted domain/problem index artifact
    #[arg(long, default_value = "pddl_index.json")]
    index: PathBuf,

    /// Persisted reference plan cache artifact
    #[arg(long, default_value = "plan_cache.json")]
    plan_cache: PathBuf,
}

/// External tool configuration.
#[derive(Args, Debug, Clone)]
struct ToolArgs {
    /// Planner launch command (space separated)
    #[arg(
        long,
        env = "PLANEVAL_PLANNER_CMD",
        default_value = "python3 -m kstar_planner.driver.main"
    )]
    planner_cmd: String,

    /// Planner search time bound
    #[arg(long, default_value = "30s")]
    search_time_limit: String,

    /// Hard wall-clock limit per planner invocation, seconds
    #[arg(long, default_value_t = 120)]
    planner_timeout: u64,

    /// Path to the VAL Validate binary
    #[arg(long, env = "PLANEVAL_VAL_BIN", default_value = "VAL/build/bin/Validate")]
    val_bin: PathBuf,

    /// Hard wall-clock limit per validator invocation, seconds
    #[arg(long, default_value_t = 60)]
    val_timeout: u64,

    /// Number of plans requested from the planner
    #[arg(short, long, default_value_t = 100)]
    k: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the reference corpus and persist the domain/problem index
    Index {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Rebuild even if the artifact already exists
        #[arg(long)]
        force: bool,
    },

    /// Plan and validate the reference plan cache
    Plans {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        tools: ToolArgs,

        /// Rebuild even if the artifact already exists
        #[arg(long)]
        force: bool,
    },

    /// Probe a single candidate domain file against a reference domain
    Probe {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        tools: ToolArgs,

        /// Reference domain name
        domain: String,

        /// Candidate domain file
        candidate: PathBuf,
    },

    /// Attach reconstruction and equivalence metrics to a parsed-outputs batch
    Annotate {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        tools: ToolArgs,

        /// Parsed-outputs batch file (JSON array of tasks)
        input: PathBuf,

        /// Output path (default: metrics-<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of concurrent probes
        #[arg(long, default_value_t = 4)]
        jobs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Index { corpus, force } => cmd_index(corpus, force),
        Commands::Plans {
            corpus,
            tools,
            force,
        } => cmd_plans(corpus, tools, force).await,
        Commands::Probe {
            corpus,
            tools,
            domain,
            candidate,
        } => cmd_probe(corpus, tools, domain, candidate).await,
        Commands::Annotate {
            corpus,
            tools,
            input,
            output,
            jobs,
        } => cmd_annotate(corpus, tools, input, output, jobs).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_index(corpus: CorpusArgs, force: bool) -> Result<()> {
    let store = open_knowledge(&corpus, force)?;
    let domains: Vec<_> = store.domain_names().cloned().collect();
    println!(
        "indexed {} domains ({} problems) -> {}",
        domains.len(),
        domains.iter().map(|d| store.problems(d).len()).sum::<usize>(),
        corpus.index.display()
    );
    Ok(())
}

async fn cmd_plans(corpus: CorpusArgs, tools: ToolArgs, force: bool) -> Result<()> {
    let knowledge = open_knowledge(&corpus, false)?;
    let (planner, validator) = tool_stack(&tools)?;

    let plans = if force {
        let built = PlanStore::build(tools.k, &knowledge, planner.as_ref(), validator.as_ref())
            .await
            .context("building the reference plan cache")?;
        built.save(&corpus.plan_cache)?;
        built
    } else {
        PlanStore::load_or_build(
            &corpus.plan_cache,
            tools.k,
            &knowledge,
            planner.as_ref(),
            validator.as_ref(),
        )
        .await
        .context("opening the reference plan cache")?
    };

    let total: usize = knowledge
        .domain_names()
        .map(|d| plans.total_plans(d))
        .sum();
    println!(
        "cached {} validated reference plans -> {}",
        total,
        corpus.plan_cache.display()
    );
    Ok(())
}

async fn cmd_probe(
    corpus: CorpusArgs,
    tools: ToolArgs,
    domain: String,
    candidate: PathBuf,
) -> Result<()> {
    let candidate_text = std::fs::read_to_string(&candidate)
        .with_context(|| format!("reading candidate domain {}", candidate.display()))?;
    let prober = open_prober(&corpus, &tools).await?;

    let outcome = prober.probe(&domain, &candidate_text).await?;
    info!(verdict = %outcome.verdict, working = outcome.working, "probe finished");
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "resultClass": outcome.verdict.class(),
            "errorSubclass": outcome.verdict.subclass(),
            "errorMsg": outcome.message,
            "workingPlans": outcome.working,
        }))?
    );
    Ok(())
}

async fn cmd_annotate(
    corpus: CorpusArgs,
    tools: ToolArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    jobs: usize,
) -> Result<()> {
    let raw = std::fs::read(&input)
        .with_context(|| format!("reading parsed-outputs batch {}", input.display()))?;
    let batch: Vec<TaskRecord> =
        serde_json::from_slice(&raw).context("parsing the task batch")?;
    info!(tasks = batch.len(), "batch loaded");

    let prober = open_prober(&corpus, &tools).await?;
    let driver = MetricDriver::new(Arc::new(prober)).with_concurrency(jobs);
    let annotated = driver.annotate(&batch).await?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("metrics-{}.json", Utc::now().timestamp())));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, serde_json::to_vec_pretty(&annotated)?)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("annotated {} tasks -> {}", annotated.len(), output.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

fn open_knowledge(corpus: &CorpusArgs, force: bool) -> Result<KnowledgeStore> {
    let store = if force {
        let built = KnowledgeStore::build(&corpus.problems, &corpus.predicate_descriptions)
            .context("building the knowledge index")?;
        built.save(&corpus.index)?;
        built
    } else {
        KnowledgeStore::load_or_build(
            &corpus.index,
            &corpus.problems,
            &corpus.predicate_descriptions,
        )
        .context("opening the knowledge index")?
    };
    Ok(store)
}

async fn open_prober(corpus: &CorpusArgs, tools: &ToolArgs) -> Result<DomainProber> {
    let knowledge = Arc::new(open_knowledge(corpus, false)?);
    let (planner, validator) = tool_stack(tools)?;
    let plans = Arc::new(
        PlanStore::load_or_build(
            &corpus.plan_cache,
            tools.k,
            &knowledge,
            planner.as_ref(),
            validator.as_ref(),
        )
        .await
        .context("opening the reference plan cache")?,
    );
    Ok(DomainProber::new(
        knowledge, plans, planner, validator, tools.k,
    ))
}

fn tool_stack(tools: &ToolArgs) -> Result<(Arc<dyn Planner>, Arc<dyn Validator>)> {
    let command: Vec<String> = tools
        .planner_cmd
        .split_whitespace()
        .map(str::to_string)
        .collect();
    anyhow::ensure!(!command.is_empty(), "planner command must not be empty");

    let planner = KstarPlanner::new(PlannerConfig {
        command,
        search_time_limit: tools.search_time_limit.clone(),
        timeout_secs: tools.planner_timeout,
    });
    let validator = ValValidator::new(ValidatorConfig {
        binary: tools.val_bin.clone(),
        timeout_secs: tools.val_timeout,
    });
    Ok((Arc::new(planner), Arc::new(validator)))
}
