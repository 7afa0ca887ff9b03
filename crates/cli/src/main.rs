use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::server::{self, AppState};
use docsearch_core::config::{self, AppConfig};
use docsearch_core::models::{Category, FileInput, QueryRequest};
use docsearch_core::pipeline;
use docsearch_core::search;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => run_serve(cfg, bind).await,
        Commands::Ingest { files, json } => run_ingest(cfg, files, json).await,
        Commands::Search {
            query,
            category,
            filename,
            limit,
        } => run_search(cfg, query, category, filename, limit).await,
        Commands::Stats => run_stats(cfg).await,
    }
}

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Classify documents by keyword and search them", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Extract, classify and store local files
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query stored documents
    Search {
        query: String,
        /// Restrict to one category (general|legal|technical|scientific|financial)
        #[arg(long)]
        category: Option<Category>,
        /// Restrict to an exact filename
        #[arg(long)]
        filename: Option<String>,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Document counts per category
    Stats,
}

async fn run_serve(cfg: AppConfig, bind: Option<String>) -> Result<()> {
    let services = pipeline::build_services(&cfg).await?;
    let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
    server::serve(AppState::new(services), &bind, cfg.server.max_upload_bytes).await
}

async fn run_ingest(cfg: AppConfig, files: Vec<PathBuf>, json: bool) -> Result<()> {
    let services = pipeline::build_services(&cfg).await?;
    let batch: Vec<FileInput> = files.into_iter().map(FileInput::from_path).collect();
    let report = pipeline::ingest(&services, batch).await;
    services.store.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "ingest: processed {}, failed {}, added to store {}",
            report.total_processed,
            report.errors.len(),
            report.added_to_store
        );
        for (category, count) in &report.by_category {
            println!("  {:<12} {}", category, count);
        }
        for err in &report.errors {
            println!("  error: {}: {}", err.filename, err.error);
        }
    }
    if let Some(e) = report.store_error {
        anyhow::bail!("store rejected the batch: {}", e);
    }
    Ok(())
}

async fn run_search(
    cfg: AppConfig,
    query: String,
    category: Option<Category>,
    filename: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let services = pipeline::build_services(&cfg).await?;
    let mut request = QueryRequest::new(query).limit(search::parse_limit(limit, services.default_limit)?);
    request.category = category;
    request.filename = filename;
    let results = search::search(services.store.as_ref(), &request)
        .await
        .context("search")?;
    services.store.close().await;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "results": results }))?);
    Ok(())
}

async fn run_stats(cfg: AppConfig) -> Result<()> {
    let services = pipeline::build_services(&cfg).await?;
    let stats = services.store.get_stats().await.context("stats")?;
    services.store.close().await;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "statistics": stats }))?);
    Ok(())
}
