//! Hybrid search CLI - run searches or serve the search API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hybrid_api::ApiServer;
use hybrid_core::{AppConfig, SearchParams, SearchResults, Strategy};
use hybrid_elastic::ElasticsearchGateway;
use hybrid_query::SearchOrchestrator;

/// Hybrid search - lexical and semantic search with rank fusion
#[derive(Parser)]
#[command(name = "hybrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/hybrid-search/config.toml, then ./hybrid-search.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP search API
    Serve {
        /// Bind address (overrides server.bind_address)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run a single search
    Search {
        /// Search query
        query: String,

        /// Dataset to search (default dataset if not specified)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Retrieval strategy: bm25 or elser
        #[arg(short, long, default_value = "bm25")]
        strategy: Strategy,

        /// Fuse semantic hits with lexical hits (elser only)
        #[arg(long)]
        rrf: bool,

        /// RRF rank constant (configured default if not specified)
        #[arg(short)]
        k: Option<u32>,

        /// Index to search instead of the dataset's index
        #[arg(short, long)]
        index: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured datasets
    Datasets,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::load_default()?,
    };
    config.elasticsearch.apply_env();
    Ok(config)
}

fn build_engine(
    config: &AppConfig,
) -> Result<SearchOrchestrator<ElasticsearchGateway>, Box<dyn std::error::Error>> {
    let registry = config.registry()?;
    let gateway = ElasticsearchGateway::new(&config.elasticsearch)?;
    Ok(SearchOrchestrator::new(
        Arc::new(gateway),
        Arc::new(registry),
        config.search.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind_address.clone());
            serve(&config, &bind).await?;
        }
        Commands::Search {
            query,
            dataset,
            strategy,
            rrf,
            k,
            index,
            json,
        } => {
            let engine = build_engine(&config)?;
            let params = SearchParams {
                query,
                dataset,
                strategy,
                rrf,
                k: k.unwrap_or(config.search.default_rrf_k),
                index,
            };
            search(&engine, params, json).await;
        }
        Commands::Datasets => {
            list_datasets(&config)?;
        }
    }

    Ok(())
}

async fn serve(config: &AppConfig, bind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(build_engine(config)?);
    let server = ApiServer::start(engine, bind).await?;

    println!("Serving search API on http://{}", server.addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.shutdown();
    Ok(())
}

async fn search(engine: &SearchOrchestrator<ElasticsearchGateway>, params: SearchParams, json: bool) {
    let results = match engine.search(params).await {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", format_results(&results));
    }
}

fn format_results(results: &SearchResults) -> String {
    let mut output = format!(
        "Found {} results in {}ms ({} on '{}'{}):\n\n",
        results.total_results,
        results.latency_ms,
        results.strategy,
        results.dataset,
        if results.fused { ", rrf" } else { "" }
    );

    for (rank, hit) in results.results.iter().enumerate() {
        let title = hit.fields.get("title").map(display_value).unwrap_or_default();
        let score = hit
            .score
            .map(|s| format!("{:.5}", s))
            .unwrap_or_else(|| "-".to_string());

        output.push_str(&format!(
            "---\n[{}] {} (id: {}, score: {})\n",
            rank + 1,
            title,
            hit.id,
            score
        ));
        if let Some(text) = hit.fields.get("text") {
            output.push_str(&format!("{}\n", display_value(text)));
        }
        if let Some(explanation) = &hit.explanation {
            output.push_str(&format!("  rrf: {}\n", explanation));
        }
        output.push('\n');
    }

    output
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(values) => values
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn list_datasets(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = config.registry()?;

    for (id, dataset) in registry.datasets() {
        let marker = if id == registry.default_id() { " (default)" } else { "" };
        println!("{} - {}{}", id, dataset.label, marker);
        println!("  index:    {}", dataset.index);
        println!("  lexical:  {}", dataset.search_fields.join(", "));
        println!("  semantic: {}", dataset.elser_search_fields.join(", "));
        println!("  returns:  {}", dataset.result_fields.join(", "));
    }

    Ok(())
}
