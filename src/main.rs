use clap::{Parser, Subcommand, ValueEnum};
use nightlist_ingest::config::Config;
use nightlist_ingest::observability::{logging, metrics};
use nightlist_ingest::pipeline::storage::{IndexSink, InMemorySink, JsonFileSink, MeilisearchSink};
use nightlist_ingest::pipeline::{run_refresh, Orchestrator, RefreshParams, RefreshStatus};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "nightlist")]
#[command(about = "Regional event-listing ingestion into a search index")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every region, dedupe, and write the batch to the index
    Refresh {
        /// Specific regions to run (comma-separated). Default: all configured regions
        #[arg(long)]
        regions: Option<String>,
        /// Where to write. Default: meili when SAVE_TO_MEILISEARCH is set, else file
        #[arg(long, value_enum)]
        sink: Option<SinkKind>,
        /// Delete all documents before adding the new batch
        #[arg(long)]
        replace: bool,
    },
    /// Query the index
    Search {
        query: String,
        #[arg(long, value_enum)]
        sink: Option<SinkKind>,
    },
    /// List configured regions and their source URLs
    Regions,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SinkKind {
    Meili,
    File,
    Memory,
}

fn create_sink(kind: Option<SinkKind>, config: &Config) -> Arc<dyn IndexSink> {
    let kind = kind.unwrap_or(if config.index.enabled {
        SinkKind::Meili
    } else {
        SinkKind::File
    });
    match kind {
        SinkKind::Meili => Arc::new(MeilisearchSink::from_config(&config.index)),
        SinkKind::File => Arc::new(JsonFileSink::new(&config.output_file)),
        SinkKind::Memory => Arc::new(InMemorySink::new()),
    }
}

fn parse_regions(regions: Option<String>, config: &Config) -> Vec<String> {
    match regions {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => config.region_ids(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Refresh {
            regions,
            sink,
            replace,
        } => {
            let regions = parse_regions(regions, &config);
            let sink = create_sink(sink, &config);
            info!("Refreshing {} regions into {}", regions.len(), sink.name());

            let orchestrator = Orchestrator::from_config(&config);
            let report = run_refresh(&orchestrator, sink, RefreshParams { regions, replace }).await;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if report.status == RefreshStatus::Error {
                warn!("Refresh failed with status {}", report.status.http_status());
                std::process::exit(1);
            }
        }
        Commands::Search { query, sink } => {
            let sink = create_sink(sink, &config);
            let results = sink.search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Regions => {
            for (id, region) in &config.regions {
                println!(
                    "{:<10} {:<16} {}",
                    id,
                    config.fallback_city_for(id),
                    region.url
                );
            }
        }
    }

    Ok(())
}
