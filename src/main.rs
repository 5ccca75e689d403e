use std::process::ExitCode;

use address_ws::cli::Cli;
use address_ws::lifecycle::startup;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match startup::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application failed");
            ExitCode::FAILURE
        }
    }
}
