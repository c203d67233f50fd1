use anyhow::Result;
use clap::Parser;
use micro_mandarin_relay::app::App;
use micro_mandarin_relay::models::Config;
use micro_mandarin_relay::server;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "micro-mandarin-relay")]
#[command(about = "Relay lesson and pronunciation requests to Gemini")]
struct CliArgs {
    /// Address to bind, overriding HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding PORT.
    #[arg(long, short)]
    port: Option<u16>,
}

impl CliArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "micro_mandarin_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting micro-mandarin-relay");

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr(), e);
            std::process::exit(1);
        }
    };

    let app = Arc::new(App::from_config(&config));
    let router = server::router(app, config.max_audio_bytes);

    server::serve(listener, router, server::shutdown_signal()).await?;
    Ok(())
}
