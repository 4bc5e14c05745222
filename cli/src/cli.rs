use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "glidepath", author, version, about = "Operator CLI for the glidepath execution engine", long_about = None)]
pub struct Cli {
    /// Path to the config file (without extension); falls back to env vars
    /// and defaults when omitted. See `glidepath-config`.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluates one equal-weight strategy over the given symbols and
    /// executes the resulting rebalance in paper mode.
    Run {
        /// Comma-separated symbol universe, e.g. AAPL,MSFT,GOOG.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Starting paper account cash and portfolio value.
        #[arg(long, default_value = "1000000")]
        seed_cash: String,
    },
    /// Looks up a run by id.
    ///
    /// Run state lives in-process only (no persisted backing store is
    /// wired up, see DESIGN.md); this only finds anything for a run
    /// started and still resolving within the same invocation, so it is
    /// mainly useful for scripting a single `run` followed by a `status`
    /// check against a long-lived embedding of this crate, not across
    /// separate CLI process invocations.
    Status {
        run_id: String,
    },
    /// Lists open positions on the configured broker.
    Positions,
    /// Cancels an open order by broker-assigned id.
    Cancel {
        order_id: String,
    },
}
