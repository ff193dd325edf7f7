//! modernizer: serve the modernization pipeline or run it over one file
//!
//! ```bash
//! # Start the upload service (reads XAI_API_KEY from the environment or .env)
//! modernizer serve --config modernizer.toml --bind 0.0.0.0:3000
//!
//! # Modernize one export and print the response JSON
//! modernizer run customers.csv --pretty
//! ```
//!
//! Without a credential every upload takes the deterministic fallback path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use legacy_modernizer::{ChatCompletionsClient, ModernizationPipeline, ModernizerConfig, server};

#[derive(Parser)]
#[command(name = "modernizer", version, about = "Modernize legacy tabular exports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP upload service
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overriding the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run the pipeline over one file and print the result
    Run {
        /// Delimited text export
        file: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,legacy_modernizer=debug,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve {
        config: None,
        bind: None,
    }) {
        Command::Serve { config, bind } => serve(config.as_deref(), bind).await,
        Command::Run {
            file,
            config,
            pretty,
        } => run(&file, config.as_deref(), pretty).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<ModernizerConfig> {
    let config = match path {
        Some(path) => ModernizerConfig::from_file(path)?,
        None => ModernizerConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn build_pipeline(config: ModernizerConfig) -> Result<ModernizationPipeline<ChatCompletionsClient>> {
    let client = ChatCompletionsClient::new(&config.generation);
    let pipeline = ModernizationPipeline::new(config, client)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if !pipeline.generation_enabled() {
        tracing::warn!("No generation credential configured; uploads will use fallback artifacts");
    }
    Ok(pipeline)
}

async fn serve(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let addr = config.server.bind.clone();

    let pipeline = Arc::new(build_pipeline(config)?);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve(pipeline, listener).await?;
    Ok(())
}

async fn run(file: &Path, config_path: Option<&Path>, pretty: bool) -> Result<()> {
    let pipeline = build_pipeline(load_config(config_path)?)?;
    let upload = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let report = pipeline
        .run(upload)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    tracing::info!(
        request_id = %report.request_id,
        duration_ms = report.duration_ms,
        fallback = report.used_fallback(),
        "Run finished"
    );

    let response = report.result.into_response();
    let output = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");
    Ok(())
}
