//! Catalog ingestion CLI.
//!
//! `ingest scrape` walks the live bulletin; `ingest csv <path>` loads a
//! pre-parsed export. Both end in the same embed-and-store pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use advisor_backend::catalog::HttpCatalogSource;
use advisor_backend::core::config::{AppPaths, Settings};
use advisor_backend::core::logging;
use advisor_backend::ingest::IngestPipeline;
use advisor_backend::llm::GeminiProvider;
use advisor_backend::rag::SqliteCourseStore;

#[derive(Parser)]
#[command(name = "ingest", about = "Ingest the course catalog into the advisor store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the bulletin site and store embedded course records.
    Scrape {
        /// Override the bulletin root from the configuration.
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Ingest a CSV export (college, department, number, course,
    /// description, tag, pre_reqs).
    Csv { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::load(&paths).context("Failed to load configuration")?;
    let cli = Cli::parse();

    let gemini = Arc::new(
        GeminiProvider::new(&settings.gemini).context("Failed to build Gemini provider")?,
    );
    let store = Arc::new(
        SqliteCourseStore::new(paths.courses_db_path.clone())
            .await
            .context("Failed to open course store")?,
    );

    let report = match cli.command {
        Command::Scrape { base_url } => {
            let base = base_url.unwrap_or_else(|| settings.ingest.catalog_base_url.clone());
            let source = Arc::new(HttpCatalogSource::new(&base)?);
            let pipeline =
                IngestPipeline::new(source, gemini, store, settings.ingest.clone());
            pipeline.run_scrape().await?
        }
        Command::Csv { path } => {
            let base = settings.ingest.catalog_base_url.clone();
            let source = Arc::new(HttpCatalogSource::new(&base)?);
            let pipeline =
                IngestPipeline::new(source, gemini, store, settings.ingest.clone());
            pipeline.run_csv(&path).await?
        }
    };

    tracing::info!(
        parsed = report.parsed,
        stored = report.stored,
        skipped = report.skipped,
        "ingestion finished"
    );
    if !report.failed_departments.is_empty() {
        tracing::warn!(
            departments = ?report.failed_departments,
            "some departments contributed no records"
        );
    }

    Ok(())
}
