mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    glidepath::logging::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { symbols, seed_cash } => commands::run::run(cli.config.as_deref(), &symbols, &seed_cash).await,
        Commands::Status { run_id } => commands::status::status(&run_id).await,
        Commands::Positions => commands::positions::positions().await,
        Commands::Cancel { order_id } => commands::cancel::cancel(&order_id).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            eprintln!("error: {error}");
            error.exit_code()
        }
    }
}
