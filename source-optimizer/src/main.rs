use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use source_optimizer::{
    rank_articles, CandidateDiscovery, EngagementAction, FeedFetcher, FetchConfig,
    HttpFeedFetcher, KeywordScorer, OptimizationPolicy, OptimizerConfig, OptimizerError,
    Schedule, ScoringEngine, SourceManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "source-optimizer", about = "Scores feed sources and keeps the pool healthy")]
struct Cli {
    /// Where accumulated source metrics are kept
    #[arg(long, env = "SOURCE_METRICS_PATH", default_value = "source_metrics.json")]
    metrics_path: PathBuf,

    #[arg(long, env = "MAX_SOURCES", default_value_t = 50)]
    max_sources: usize,

    #[arg(long, env = "ENGAGEMENT_THRESHOLD", default_value_t = 0.3)]
    engagement_threshold: f64,

    #[arg(long, env = "RELEVANCE_THRESHOLD", default_value_t = 0.5)]
    relevance_threshold: f64,

    /// Per-request timeout for feed fetches and probes
    #[arg(long, env = "FETCH_TIMEOUT_SECONDS", default_value_t = 30)]
    timeout_seconds: u64,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Do not probe the bootstrap seed feeds on start
    #[arg(long)]
    no_seed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch + maintenance on a schedule (daily 09:00 unless told otherwise)
    Run {
        /// Run a single pass now and exit
        #[arg(long)]
        once: bool,
        /// Daily run time, HH:MM
        #[arg(long, conflicts_with = "weekly")]
        daily: Option<String>,
        /// Weekday for a weekly run, e.g. monday
        #[arg(long)]
        weekly: Option<String>,
        /// Time of day for --weekly, HH:MM
        #[arg(long, default_value = "09:00")]
        at: String,
    },
    /// Score the top sources once and print the best articles
    Fetch,
    /// Evict, discover, admit and persist once
    Optimize,
    /// Probe and add a source
    Add { name: String, url: String },
    /// Remove a source and its metrics
    Remove { name: String },
    /// Record a user click or download for a source
    Engage {
        name: String,
        #[arg(value_parser = parse_action)]
        action: EngagementAction,
    },
    /// Print the best sources
    Top {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the performance report
    Report,
    /// Print discovery candidates not yet tracked
    Discover,
}

impl Command {
    fn needs_seed(&self) -> bool {
        matches!(self, Self::Run { .. } | Self::Fetch | Self::Optimize)
    }
}

impl Cli {
    fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            engagement_threshold: self.engagement_threshold,
            relevance_threshold: self.relevance_threshold,
            max_sources: self.max_sources,
            metrics_path: self.metrics_path.clone(),
            ..OptimizerConfig::default()
        }
    }

    fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_seconds: self.timeout_seconds,
            ..FetchConfig::default()
        }
    }
}

fn parse_action(raw: &str) -> Result<EngagementAction, OptimizerError> {
    raw.parse()
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One scheduled pass: score the current pool, then reshape it.
async fn run_pass(manager: &mut SourceManager, scoring: &ScoringEngine, policy: &OptimizationPolicy) {
    info!("Starting scheduled pass");
    let report = scoring.run_fetch_cycle(manager).await;
    let top = rank_articles(report.articles, manager.config().top_articles);
    for (rank, article) in top.iter().enumerate() {
        info!(
            rank = rank + 1,
            source = %article.source,
            score = article.score,
            "{}",
            article.item.title
        );
    }
    policy.run_cycle(manager).await;
}

async fn run_scheduler(
    manager: &mut SourceManager,
    scoring: &ScoringEngine,
    policy: &OptimizationPolicy,
    schedule: Schedule,
) -> anyhow::Result<()> {
    info!("Scheduled {}", schedule);
    loop {
        let now = Local::now().naive_local();
        let next = schedule.next_run_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next run at {} (in {}s)", next, wait.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(wait) => run_pass(manager, scoring, policy).await,
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                info!("Shutting down scheduler");
                if !manager.save_metrics() {
                    warn!("Final metrics save failed");
                }
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let fetcher: Arc<dyn FeedFetcher> = Arc::new(
        HttpFeedFetcher::new(cli.fetch_config()).context("building HTTP client")?,
    );
    let config = cli.optimizer_config();

    let mut manager = if cli.command.needs_seed() {
        SourceManager::bootstrap(config, fetcher).await
    } else {
        let mut manager = SourceManager::new(config, fetcher);
        manager.load();
        manager
    };
    info!("Tracking {} sources", manager.registry().len());

    let scoring = ScoringEngine::new(
        Arc::new(KeywordScorer::default()),
        manager.config().relevance_cutoff,
    );
    let policy = OptimizationPolicy::default();

    match cli.command {
        Command::Run {
            once,
            daily,
            weekly,
            at,
        } => {
            if once {
                run_pass(&mut manager, &scoring, &policy).await;
                return Ok(());
            }
            let schedule = match (daily, weekly) {
                (_, Some(day)) => Schedule::weekly(&day, &at)?,
                (Some(time), None) => Schedule::daily(&time)?,
                (None, None) => Schedule::daily("09:00")?,
            };
            run_scheduler(&mut manager, &scoring, &policy, schedule).await?;
        }
        Command::Fetch => {
            let report = scoring.run_fetch_cycle(&mut manager).await;
            if !report.sources_failed.is_empty() {
                warn!("Sources that failed to fetch: {}", report.sources_failed.join(", "));
            }
            let top = rank_articles(report.articles, manager.config().top_articles);
            manager.save_metrics();
            print_json(&top)?;
        }
        Command::Optimize => {
            let summary = policy.run_cycle(&mut manager).await;
            print_json(&summary)?;
        }
        Command::Add { name, url } => {
            if let Err(e) = manager.try_add_source(&name, &url).await {
                error!(source = %name, "Source rejected: {}", e);
                bail!("could not add {}: {}", name, e);
            }
            info!(source = %name, "Added source");
            manager.save_metrics();
        }
        Command::Remove { name } => {
            if !manager.remove_source(&name) {
                info!(source = %name, "Source was not tracked");
            }
            manager.save_metrics();
        }
        Command::Engage { name, action } => {
            if !manager.record_user_engagement(&name, action) {
                return Err(OptimizerError::UnknownSource { name }.into());
            }
            manager.save_metrics();
        }
        Command::Top { limit } => print_json(&manager.get_top_sources(limit))?,
        Command::Report => print_json(&manager.get_performance_report())?,
        Command::Discover => {
            let candidates = CandidateDiscovery::default()
                .discover(manager.registry())
                .await;
            print_json(&candidates)?;
        }
    }

    Ok(())
}
