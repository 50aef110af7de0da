//! `rusty-automation-tool` CLI entry-point.
//!
//! Available sub-commands:
//! - `run`: execute a workflow once and print the run result.
//! - `validate`: check a workflow JSON file and print its execution order.
//! - `serve`: start the HTTP API that accepts trigger events.
//! - `migrate`: create the workflow graph tables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engine::{
    ExecutorRegistry, InMemoryWorkflowStore, LocalStepRunner, PgWorkflowLoader, RetryConfig,
    TriggerEvent, WorkflowExecutor, WorkflowGraph, WorkflowLoader,
};
use nodes::HttpRequestConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rusty-automation-tool",
    about = "Workflow automation engine",
    version
)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

/// Engine tuning shared by every command that runs workflows.
#[derive(Args)]
struct EngineArgs {
    /// Retries for a node failing with a retryable error.
    #[arg(long, global = true, env = "MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
    /// Base delay of the exponential back-off between retries.
    #[arg(long, global = true, env = "RETRY_BASE_DELAY_MS", default_value_t = 100)]
    retry_base_delay_ms: u64,
    /// Timeout for each outbound HTTP request.
    #[arg(long, global = true, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    http_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a workflow once.
    Run {
        /// Workflow to run. Defaults to the id inside `--file`.
        #[arg(long)]
        workflow_id: Option<String>,
        /// Read the graph from a JSON file instead of the database.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
        /// Initial context as a JSON object.
        #[arg(long)]
        input: Option<String>,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// Start the REST API server.
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { workflow_id, file, database_url, input } => {
            let (loader, default_id): (Arc<dyn WorkflowLoader>, Option<String>) = match file {
                Some(path) => {
                    let graph = read_graph(&path)?;
                    let id = graph.id.clone();
                    let store = InMemoryWorkflowStore::new();
                    store.insert(graph).await;
                    (Arc::new(store), Some(id))
                }
                None => {
                    let url = database_url
                        .context("either --file or --database-url (DATABASE_URL) is required")?;
                    let pool = db::pool::create_pool(&url, 2).await?;
                    (Arc::new(PgWorkflowLoader::new(pool)), None)
                }
            };

            let mut event = TriggerEvent {
                workflow_id: workflow_id.or(default_id),
                ..TriggerEvent::default()
            };
            if let Some(raw) = input {
                event.initial_data =
                    Some(serde_json::from_str(&raw).context("--input is not valid JSON")?);
            }

            let executor = build_executor(&cli.engine, loader)?;
            let result = executor.execute(event).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Validate { path } => {
            let graph = read_graph(&path)?;
            match engine::validate_dag(&graph) {
                Ok(order) => {
                    println!("Workflow is valid. Execution order: {order:?}");
                }
                Err(e) => {
                    eprintln!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { bind, database_url } => {
            info!("Starting API server on {bind}");
            let pool = db::pool::create_pool(&database_url, 10).await?;
            let executor = build_executor(&cli.engine, Arc::new(PgWorkflowLoader::new(pool)))?;
            api::serve(&bind, Arc::new(executor)).await?;
        }
        Command::Migrate { database_url } => {
            let pool = db::pool::create_pool(&database_url, 2).await?;
            db::pool::run_migrations(&pool).await?;
            info!("Migrations applied successfully");
        }
    }

    Ok(())
}

fn build_executor(args: &EngineArgs, loader: Arc<dyn WorkflowLoader>) -> Result<WorkflowExecutor> {
    let http = HttpRequestConfig {
        timeout: Duration::from_secs(args.http_timeout_secs),
        ..HttpRequestConfig::default()
    };
    let retry = RetryConfig {
        max_retries: args.max_retries,
        retry_base_delay: Duration::from_millis(args.retry_base_delay_ms),
    };

    let registry = ExecutorRegistry::builtin(&http)?;
    Ok(WorkflowExecutor::new(
        loader,
        Arc::new(registry),
        Arc::new(LocalStepRunner::new(retry)),
    ))
}

fn read_graph(path: &Path) -> Result<WorkflowGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).context("invalid workflow JSON")
}
