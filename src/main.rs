use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use devcost::api::{self, AppState};
use devcost::aws::iam::IamCreatorResolver;
use devcost::aws::metrics::CloudWatchMetrics;
use devcost::aws::AwsClients;
use devcost::cache::Cache;
use devcost::checkers::default_checkers;
use devcost::config::Config;

#[derive(Parser)]
#[command(name = "devcost")]
#[command(
    about = "Read-only cost and resource-usage API for an AWS account",
    long_about = "devcost serves a small JSON API over AWS billing and inventory data.\n\nEndpoints:\n  - /costs/projects and /costs/tag: Cost Explorer aggregations\n  - /resources/unused: paid resources that look idle or orphaned\n  - /getresourcesbytag: tag-based resource lookup\n  - /users: IAM usernames\n\nCredentials come from the environment (AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY)\nwhen set, otherwise from the configured shared-config profile."
)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long, env = "DEVCOST_BIND")]
    bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "DEVCOST_PORT")]
    port: Option<u16>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let sdk_config = config.aws_sdk_config().await;
    let clients = AwsClients::new(&sdk_config);

    let metrics = Arc::new(CloudWatchMetrics::new(clients.cloudwatch.clone()));
    let checkers = default_checkers(&clients, metrics);
    let resolver = Arc::new(IamCreatorResolver::new(clients.iam.clone()));

    let cache = match &config.cache {
        Some(settings) => match Cache::new(settings) {
            Ok(cache) => {
                info!(url = %settings.redis_url, "cost cache enabled");
                Some(cache)
            }
            Err(e) => {
                warn!("cache disabled, failed to open Redis client: {e}");
                None
            }
        },
        None => None,
    };

    let state = Arc::new(AppState {
        clients,
        checkers,
        resolver,
        cache,
    });

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, api::router(state))
        .await
        .context("server error")?;
    Ok(())
}
