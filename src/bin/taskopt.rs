//! taskopt CLI: operator interface to the task optimizer.

use clap::{Args, Parser, Subcommand};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use taskopt::config::{Config, optimizer_from_env, policy::PolicyFile};
use taskopt::db::Db;
use taskopt::model::{AssignmentMode, ProjectId, UserId, WorkloadMetric};
use taskopt::optimizer::OptimizerConfig;
use taskopt::repository::memory::MemoryStore;
use taskopt::repository::{TaskRepository, UserFilter, UserRepository};
use taskopt::service::{OptimizationReport, OptimizeRequest, OptimizerService};
use taskopt::telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};

#[derive(Parser)]
#[command(name = "taskopt", about = "Load-balancing task assignment")]
struct Cli {
    /// Read users and tasks from a JSON fixture instead of Postgres
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assign eligible tasks to the least-loaded candidates
    Optimize(OptimizeArgs),
    /// Show candidate users and their current workload
    Workload {
        /// Comma-separated user ids to include
        #[arg(long, value_delimiter = ',')]
        users: Option<Vec<i64>>,
        /// Workload metric: effort | priority
        #[arg(long)]
        metric: Option<String>,
    },
    /// Run database migrations
    Migrate,
}

#[derive(Args)]
struct OptimizeArgs {
    /// Project to optimize (all projects when omitted)
    #[arg(long)]
    project: Option<i64>,
    /// Comma-separated candidate user ids
    #[arg(long, value_delimiter = ',')]
    users: Option<Vec<i64>>,
    /// unassigned | rebalance
    #[arg(long)]
    mode: Option<String>,
    /// effort | priority
    #[arg(long)]
    metric: Option<String>,
    /// TOML policy file with an [optimizer] table
    #[arg(long)]
    policy: Option<PathBuf>,
    /// Do not compute due dates
    #[arg(long)]
    no_due_dates: bool,
    /// Plan only; write nothing back
    #[arg(long)]
    dry_run: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _guard = telemetry()?;

    match cli.command {
        Command::Migrate => {
            let db = connect().await?;
            db.health_check().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Command::Optimize(args) => {
            let optimizer = resolve_optimizer_config(&args)?;
            let request = build_request(&args);
            let report = match cli.fixture {
                Some(path) => {
                    let store = Arc::new(MemoryStore::load(&path).await?);
                    run(Arc::clone(&store), store, optimizer, request).await?
                }
                None => {
                    let db = Arc::new(connect().await?);
                    run(Arc::clone(&db), db, optimizer, request).await?
                }
            };
            print_report(&report, args.json)
        }
        Command::Workload { users, metric } => {
            let filter = UserFilter {
                user_ids: users.map(|ids| ids.into_iter().map(UserId).collect()),
                metric: match metric {
                    Some(m) => m.parse()?,
                    None => optimizer_from_env()?.metric,
                },
            };
            match cli.fixture {
                Some(path) => cmd_workload(&MemoryStore::load(&path).await?, &filter).await,
                None => cmd_workload(&connect().await?, &filter).await,
            }
        }
    }
}

fn telemetry() -> anyhow::Result<TelemetryGuard> {
    let guard = init_telemetry(TelemetryConfig {
        endpoint: std::env::var("OTEL_ENDPOINT").ok(),
        service_name: "taskopt".to_string(),
        default_filter: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
    })?;
    Ok(guard)
}

/// Connect and bring the schema up to date.
async fn connect() -> anyhow::Result<Db> {
    let config = Config::from_env()?;
    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;
    Ok(db)
}

/// Environment first, then the policy file, then explicit flags.
fn resolve_optimizer_config(args: &OptimizeArgs) -> anyhow::Result<OptimizerConfig> {
    let mut config = optimizer_from_env()?;
    if let Some(ref path) = args.policy {
        config = PolicyFile::load(path)?.apply(config);
    }
    if let Some(ref mode) = args.mode {
        config.mode = mode.parse::<AssignmentMode>()?;
    }
    if let Some(ref metric) = args.metric {
        config.metric = metric.parse::<WorkloadMetric>()?;
    }
    if args.no_due_dates {
        config.due_dates = false;
    }
    config.validate()?;
    Ok(config)
}

fn build_request(args: &OptimizeArgs) -> OptimizeRequest {
    OptimizeRequest {
        project_id: args.project.map(ProjectId),
        candidate_user_ids: args
            .users
            .as_ref()
            .map(|ids| ids.iter().copied().map(UserId).collect()),
        dry_run: args.dry_run,
    }
}

async fn run<T: TaskRepository, U: UserRepository>(
    tasks: Arc<T>,
    users: Arc<U>,
    config: OptimizerConfig,
    request: OptimizeRequest,
) -> anyhow::Result<OptimizationReport> {
    let service = OptimizerService::new(tasks, users, config);
    Ok(service.run(request).await?)
}

fn print_report(report: &OptimizationReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Run {} (mode: {}, metric: {}{})",
        &report.run_id.to_string()[..8],
        report.mode,
        report.metric,
        if report.dry_run { ", dry run" } else { "" }
    );

    if report.committed.is_empty() {
        println!("No tasks assigned.");
    } else {
        println!(
            "{:<8}  {:<30}  {:<8}  {:<8}  DUE",
            "TASK", "TITLE", "FROM", "TO"
        );
        println!("{}", "-".repeat(80));
        for a in &report.committed {
            let title: String = a.title.chars().take(30).collect();
            println!(
                "{:<8}  {:<30}  {:<8}  {:<8}  {}",
                a.task_id,
                title,
                a.previous_assignee
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                a.assignee_id,
                a.due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    println!("\nLoads:");
    for (user, load) in &report.loads {
        println!("  user {user:<6} {load}");
    }

    if !report.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for d in &report.diagnostics {
            println!("  {d}");
        }
    }

    println!("\n{} task(s) assigned", report.committed.len());
    Ok(())
}

async fn cmd_workload<U: UserRepository>(repo: &U, filter: &UserFilter) -> anyhow::Result<()> {
    let users = repo.active_candidates(filter).await?;
    if users.is_empty() {
        println!("No active users found.");
        return Ok(());
    }

    println!("{:<8}  LOAD ({})", "USER", filter.metric);
    println!("{}", "-".repeat(24));
    for user in &users {
        println!("{:<8}  {}", user.id, user.current_load);
    }
    println!("\n{} user(s)", users.len());
    Ok(())
}
