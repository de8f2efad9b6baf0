mod pipeline;

use hotpost_core::{AppConfig, CoreError, ErrorReporter};
use pipeline::{RunSummary, POST_LIMIT, SUBREDDIT};
use reddit_client::RedditClient;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "hotpost=info,reddit_client=info,database=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting hotpost: r/{} hot, limit {}", SUBREDDIT, POST_LIMIT);

    match run().await {
        Ok(summary) => {
            tracing::info!(
                "Done: fetched {} post(s), stored {} new",
                summary.fetched,
                summary.inserted
            );
            Ok(())
        }
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            Err(anyhow::Error::new(e).context("hotpost run failed"))
        }
    }
}

async fn run() -> Result<RunSummary, CoreError> {
    let config_path = AppConfig::resolve_path();
    let AppConfig { reddit, postgres } = AppConfig::load(&config_path)?;
    tracing::debug!("Loaded configuration from {}", config_path.display());

    let database_url = postgres.connection_url()?;
    let mut source = RedditClient::new(reddit)?;

    pipeline::run(&mut source, &database_url, SUBREDDIT, POST_LIMIT).await
}
