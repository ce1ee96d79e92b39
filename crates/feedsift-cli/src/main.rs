mod deliver;
mod ingest;

use clap::{Parser, Subcommand};
use feedsift_core::{AppConfig, RunSummary};

#[derive(Debug, Parser)]
#[command(name = "feedsift")]
#[command(about = "Feed ingestion, relevance scoring, and delivery pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Normalize payload files and ingest them into the corpus.
    Ingest {
        /// Input files as `kind=path` (kinds: rss, api, search, social),
        /// each a JSON-lines file of feed adapter payloads.
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Select novel high-relevance records and print them for the notifier.
    Deliver,
    /// Ingest then deliver in one invocation.
    Run {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = feedsift_core::load_app_config()?;
    init_tracing(&config);
    tracing::debug!(?config, "configuration loaded");

    let summary = match cli.command {
        Commands::Ingest { inputs } => {
            let result = ingest::run_ingest(&config, &inputs).await?;
            RunSummary {
                added: result.added,
                skipped_duplicates: result.skipped_duplicates,
                failed_to_score: result.failed_to_score,
                delivered: 0,
            }
        }
        Commands::Deliver => {
            let delivered = deliver::run_deliver(&config).await?;
            RunSummary {
                delivered,
                ..RunSummary::default()
            }
        }
        Commands::Run { inputs } => {
            let result = ingest::run_ingest(&config, &inputs).await?;
            let delivered = deliver::run_deliver(&config).await?;
            RunSummary {
                added: result.added,
                skipped_duplicates: result.skipped_duplicates,
                failed_to_score: result.failed_to_score,
                delivered,
            }
        }
    };

    tracing::info!(
        added = summary.added,
        skipped_duplicates = summary.skipped_duplicates,
        failed_to_score = summary.failed_to_score,
        delivered = summary.delivered,
        "run complete"
    );
    eprintln!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Object store client shared by every command, built from configuration.
pub(crate) fn object_store(
    config: &AppConfig,
) -> anyhow::Result<feedsift_store::ObjectStore> {
    let retry = feedsift_core::RetryPolicy::exponential(
        config.store_max_retries,
        config.store_backoff_base(),
    );
    Ok(feedsift_store::ObjectStore::new(
        &config.store_base_url,
        &config.store_bucket,
        config.store_timeout(),
        retry,
        config.upload_chunk_size,
    )?)
}
