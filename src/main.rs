use std::path::Path;
use std::sync::Arc;

use asistan_brain::Brain;
use asistan_core::config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config_path = std::env::var("ASISTAN_CONFIG").unwrap_or_else(|_| "asistan.toml".to_string());

    let config = Config::load(Path::new(&config_path)).unwrap_or_else(|e| {
        eprintln!("fatal: failed to load config: {e}");
        std::process::exit(1);
    });

    // RUST_LOG wins over the configured level
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("fatal: failed to set tracing subscriber: {e}");
        std::process::exit(1);
    }

    if config.telegram.token.is_empty() {
        error!("ASISTAN_TELEGRAM_TOKEN is not set");
        std::process::exit(1);
    }

    info!(config = %config_path, "asistan starting");

    let brain = match Brain::new(config).await {
        Ok(brain) => Arc::new(brain),
        Err(e) => {
            error!(error = %e, "failed to initialize brain");
            std::process::exit(1);
        }
    };
    let poller = brain.reminder_poller();

    tokio::select! {
        result = brain.run() => {
            if let Err(e) = result {
                error!(error = %e, "brain stopped");
                std::process::exit(1);
            }
        }
        result = poller.run() => {
            if let Err(e) = result {
                error!(error = %e, "reminder poller stopped");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
}
