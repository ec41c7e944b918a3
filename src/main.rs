//! jira-export - fetch and export JIRA data from the command line.

use std::process::ExitCode;

use clap::Parser;

use jira_export::cli::{self, Cli};
use jira_export::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine; the environment may already be set.
    dotenv::dotenv().ok();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    cli::run(cli).await
}
