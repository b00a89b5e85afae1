mod api;
mod error;
mod lifecycle;
mod watch;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stackwatch_cloud::ProvisioningClient;
use stackwatch_cloud_aws::CloudFormationProvisioner;
use stackwatch_stream::StreamConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stackwatchd")]
#[command(about = "Provision tenant stacks and stream their events", long_about = None)]
#[command(version)]
struct Cli {
    /// AWS region (defaults to the ambient AWS configuration)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Seconds between polls of a stream session
    #[arg(
        long,
        global = true,
        env = "STACKWATCH_POLL_INTERVAL_SECS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "STACKWATCH_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
    },
    /// Follow one stack's events until it settles
    Watch {
        /// Stack name
        stack: String,

        /// Print the text/event-stream encoding instead of formatted output
        #[arg(long)]
        raw: bool,
    },
}

impl Cli {
    fn stream_config(&self) -> StreamConfig {
        StreamConfig::default().with_poll_interval(Duration::from_secs(self.poll_interval_secs))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout belongs to `watch` output; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let stream_config = cli.stream_config();
    let provisioner = CloudFormationProvisioner::from_env(cli.region.clone()).await;
    let client: Arc<dyn ProvisioningClient> = Arc::new(provisioner);

    match cli.command {
        Commands::Serve { listen } => serve(client, stream_config, listen).await,
        Commands::Watch { stack, raw } => {
            let code = watch::run(client, stack, stream_config, raw).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}

async fn serve(
    client: Arc<dyn ProvisioningClient>,
    stream_config: StreamConfig,
    listen: SocketAddr,
) -> anyhow::Result<()> {
    tracing::info!(
        backend = client.name(),
        poll_interval = ?stream_config.poll_interval,
        "stackwatchd starting"
    );

    let router = api::router(api::AppState::new(client, stream_config));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;
    tracing::info!("listening on http://{}", listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("stackwatchd shut down");
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
