use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chain-data-gateway", version, about = "Aggregating read gateway over a chain RPC node")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Override bind address, e.g. 0.0.0.0:3000
        #[arg(long)]
        addr: Option<String>,
    },
    /// Scan the most recent blocks and print them as JSON
    Scan {
        /// Window size below the tip; defaults to SCAN_WINDOW
        #[arg(long)]
        window: Option<u64>,
        /// Include normalized transactions instead of per-block counts
        #[arg(long, default_value_t = false)]
        with_txs: bool,
    },
    /// Print the merged confirmed + pending transaction feed
    Feed,
    /// Print chain summary stats
    Stats,
}
