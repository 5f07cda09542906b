mod access;
mod aggregator;
mod boundary;
mod cli;
mod debounce;
mod exec;
mod host;
mod media;
mod snapshot;
mod tiling;
mod widget;
mod wm;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries the host protocol.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            auto_tiling,
            tiling_endpoint,
            volume_debounce_ms,
            progress_debounce_ms,
        } => {
            let config = widget::WidgetConfig {
                auto_tiling,
                tiling_endpoint,
                volume_debounce: Duration::from_millis(volume_debounce_ms),
                progress_debounce: Duration::from_millis(progress_debounce_ms),
            };
            if let Err(e) = widget::run(config).await {
                tracing::error!(error = %e, "widget failed");
                eprintln!("barlink run: {e}");
                std::process::exit(1);
            }
        }
        Command::Tiling { endpoint } => {
            if let Err(e) = tiling::run(endpoint).await {
                tracing::error!(error = %e, "tiling agent failed");
                eprintln!("barlink tiling: {e}");
                std::process::exit(1);
            }
        }
    }
}
