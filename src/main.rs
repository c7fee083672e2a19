//! Review Cascade CLI
//!
//! Thin binary over the library: loads the review configuration, reads
//! the diff JSON produced by the host's git plumbing, runs the pipeline,
//! renders the markdown summary, and maps the outcome to the process
//! exit status (0 passed, 1 failing verdict, 2 fatal abort or setup
//! error).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};

use review_cascade_core::{AgentContext, DiffFile, RunTrigger};

use review_cascade::services::agents::AgentRegistry;
use review_cascade::services::budget::BudgetTracker;
use review_cascade::services::cache::ResultCache;
use review_cascade::{
    ExecutionOrchestrator, ReportAdapter, ReviewConfig, SummaryAdapter, SummaryTarget,
};

#[derive(Parser)]
#[command(
    name = "review-cascade",
    about = "Automated pull-request review orchestrator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Review a change and render the summary
    Run(RunArgs),
    /// Remove every cached agent result
    ClearCache(ClearCacheArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Review configuration TOML
    #[arg(long, default_value = "review.toml")]
    config: PathBuf,

    /// Diff JSON produced by the host (array of changed files with hunks)
    #[arg(long)]
    diff: PathBuf,

    /// Pull request number; enables result caching together with --head
    #[arg(long)]
    pr: Option<u64>,

    /// Head commit the diff was computed against
    #[arg(long)]
    head: Option<String>,

    /// Branch the change targets or was pushed to
    #[arg(long, default_value = "main")]
    branch: String,

    /// What started the run
    #[arg(long, value_enum, default_value_t = TriggerArg::Manual)]
    trigger: TriggerArg,

    /// Write the markdown summary to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// USD already spent this month, as reported by the host
    #[arg(long, default_value_t = 0.0)]
    monthly_spent: f64,
}

#[derive(Args)]
struct ClearCacheArgs {
    /// Review configuration TOML
    #[arg(long, default_value = "review.toml")]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TriggerArg {
    PullRequest,
    Push,
    Manual,
}

impl std::fmt::Display for TriggerArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerArg::PullRequest => write!(f, "pull-request"),
            TriggerArg::Push => write!(f, "push"),
            TriggerArg::Manual => write!(f, "manual"),
        }
    }
}

impl From<TriggerArg> for RunTrigger {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::PullRequest => RunTrigger::PullRequest,
            TriggerArg::Push => RunTrigger::Push,
            TriggerArg::Manual => RunTrigger::Manual,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Run(args) => run(args).await,
        Command::ClearCache(args) => clear_cache(args).map(|()| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

/// Execute one review run. Returns whether the verdict passed.
async fn run(args: RunArgs) -> anyhow::Result<bool> {
    let config =
        Arc::new(ReviewConfig::load(&args.config).context("loading review configuration")?);

    let diff_text = std::fs::read_to_string(&args.diff)
        .with_context(|| format!("reading diff {}", args.diff.display()))?;
    let files: Vec<DiffFile> = serde_json::from_str(&diff_text).context("parsing diff JSON")?;

    let run_id = uuid::Uuid::new_v4();
    tracing::info!(
        %run_id,
        files = files.len(),
        trigger = %args.trigger,
        branch = %args.branch,
        "starting review run"
    );

    let mut ctx = AgentContext::new(files, config.config_hash(), Utc::now())
        .with_branch(&args.branch)
        .with_trigger(args.trigger.into());
    if let Some(pr) = args.pr {
        ctx = ctx.with_pr(pr);
    }
    if let Some(head) = &args.head {
        ctx = ctx.with_head_commit(head);
    }

    let budget = Arc::new(BudgetTracker::new(&config.limits, args.monthly_spent));
    if ctx.files.len() as u32 > config.limits.max_files {
        budget.mark_exhausted(format!(
            "diff touches {} files (limit {})",
            ctx.files.len(),
            config.limits.max_files
        ));
    } else if ctx.total_diff_lines() > config.limits.max_diff_lines {
        budget.mark_exhausted(format!(
            "diff has {} changed lines (limit {})",
            ctx.total_diff_lines(),
            config.limits.max_diff_lines
        ));
    }

    let registry = Arc::new(AgentRegistry::builtin(&config));
    let mut orchestrator =
        ExecutionOrchestrator::new(Arc::clone(&config), registry, Arc::clone(&budget));
    if config.cache.enabled {
        let cache = match &config.cache.path {
            Some(path) => ResultCache::open(path, config.cache.ttl_secs)?,
            None => ResultCache::in_memory(config.cache.ttl_secs)?,
        };
        orchestrator = orchestrator.with_cache(Arc::new(cache));
    }

    let report = review_cascade::run_review(&orchestrator, &config, &ctx).await?;

    let target = match args.output {
        Some(path) => SummaryTarget::File(path),
        None => SummaryTarget::Stdout,
    };
    SummaryAdapter::new(target).publish(&report).await?;

    tracing::info!(
        %run_id,
        passed = report.verdict.passed,
        findings = report.complete_findings.len(),
        salvaged = report.partial_findings.len(),
        skipped = report.skipped_agents.len(),
        spent_usd = budget.run_spent_usd(),
        "review run finished"
    );

    Ok(report.verdict.passed)
}

fn clear_cache(args: ClearCacheArgs) -> anyhow::Result<()> {
    let config = ReviewConfig::load(&args.config).context("loading review configuration")?;
    let Some(path) = &config.cache.path else {
        tracing::info!("cache is in-memory only; nothing to clear");
        return Ok(());
    };
    let cache = ResultCache::open(path, config.cache.ttl_secs)?;
    let removed = cache.clear()?;
    tracing::info!(removed, "cache cleared");
    Ok(())
}
