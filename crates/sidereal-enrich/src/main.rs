//! Sidereal Enrich binary entry point.
//!
//! Enriches a query read from disk against a schema file and prints the
//! result.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use sidereal_enrich::{AttributeKey, EnrichConfig, Enricher, MemoryRegistry};

#[derive(Parser)]
#[command(name = "sidereal-enrich")]
#[command(about = "Fill in attribute types on a log query")]
#[command(version)]
struct Cli {
    /// Query request (JSON)
    #[arg(short, long)]
    query: PathBuf,

    /// Attribute descriptors (JSON array)
    #[arg(short, long)]
    schema: PathBuf,

    /// Configuration file (defaults to enrich.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sidereal_enrich=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EnrichConfig::load_from(&path.to_string_lossy())?,
        None => EnrichConfig::load()?,
    };

    let descriptors = read_schema(&cli.schema)?;
    tracing::info!(descriptors = descriptors.len(), "schema loaded");

    let request = std::fs::read_to_string(&cli.query)
        .with_context(|| format!("reading query {}", cli.query.display()))?;

    let enricher = Enricher::new(MemoryRegistry::with_fields(descriptors), &config);
    let output = enricher.enrich_json(&request).await?;
    println!("{output}");

    Ok(())
}

fn read_schema(path: &Path) -> anyhow::Result<Vec<AttributeKey>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing schema {}", path.display()))
}
