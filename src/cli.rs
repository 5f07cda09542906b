use clap::{Parser, Subcommand};

use crate::tiling::DEFAULT_ENDPOINT;

#[derive(Parser)]
#[command(name = "barlink", about = "Status bar widget core for a tiling desktop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the widget, bridged to the host over stdin/stdout
    Run {
        /// Keep the auto-tiling socket agent running
        #[arg(long)]
        auto_tiling: bool,

        /// Tiling window manager control socket
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        tiling_endpoint: String,

        /// Quiet window before a volume change is sent
        #[arg(long, default_value_t = 50)]
        volume_debounce_ms: u64,

        /// Quiet window before a progress redraw
        #[arg(long, default_value_t = 250)]
        progress_debounce_ms: u64,
    },

    /// Run only the auto-tiling agent
    Tiling {
        /// Tiling window manager control socket
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },
}
