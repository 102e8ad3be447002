use std::time::Duration;

use clap::Parser;
use hoard::prelude::*;

/// Authoritative shared-world session server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind both listeners to
    #[arg(short = 'H', long, env = "HOARD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// WebSocket port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// HTTP inspection port; 0 disables the inspection endpoints
    #[arg(long, env = "HOARD_HTTP_PORT", default_value_t = 3001)]
    http_port: u16,

    /// Balance every participant starts with and can never exceed
    #[arg(long, env = "HOARD_MAX_TOKENS", default_value_t = 5)]
    max_tokens: u32,

    /// Seconds without activity before a participant is evicted
    #[arg(long, env = "HOARD_IDLE_TIMEOUT_SECS", default_value_t = 600)]
    idle_timeout_secs: u64,

    /// Seconds between idle sweeps; 0 disables the reaper
    #[arg(long, env = "HOARD_REAP_INTERVAL_SECS", default_value_t = 300)]
    reap_interval_secs: u64,

    /// Seconds between status broadcasts; 0 disables them
    #[arg(long, env = "HOARD_STATUS_INTERVAL_SECS", default_value_t = 30)]
    status_interval_secs: u64,
}

impl Args {
    fn hub_config(&self) -> HubConfig {
        let seconds = |s: u64| Some(Duration::from_secs(s)).filter(|d| !d.is_zero());
        HubConfig {
            world: WorldConfig {
                max_tokens: self.max_tokens,
                ..WorldConfig::default()
            },
            session: SessionConfig {
                idle_timeout: Duration::from_secs(self.idle_timeout_secs),
                ..SessionConfig::default()
            },
            reap_interval: seconds(self.reap_interval_secs),
            status_interval: seconds(self.status_interval_secs),
            ..HubConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), HoardError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoard=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let ws_addr = format!("{}:{}", args.host, args.port);

    let mut builder = HoardServer::builder().bind(&ws_addr).hub_config(args.hub_config());
    if args.http_port != 0 {
        builder = builder.http_bind(&format!("{}:{}", args.host, args.http_port));
    }

    let server = builder.build().await?;
    tracing::info!(
        ws = %ws_addr,
        max_tokens = args.max_tokens,
        idle_timeout_secs = args.idle_timeout_secs,
        "Hoard ready"
    );

    server.run_until(shutdown_signal()).await
}
