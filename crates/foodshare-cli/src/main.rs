mod cli;
mod commands;
mod error;
mod logger;
mod metadata;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    logger::initialize_logger();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    if let Some(envelope) = commands::run(&cli).await? {
        output::render(&envelope, cli.format, cli.pretty)?;
    }

    Ok(())
}
