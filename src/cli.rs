//! Command-line interface.
//!
//! `jira-export [-v] {issues|changelog} <project> [-o PATH] [-f JQL] [--format FMT]`

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::info;

use crate::api::{IssueSource, JiraSession};
use crate::config::ConnectionSettings;
use crate::error::{Result, ToolError};
use crate::export::{self, ExportError, OutputFormat};
use crate::fetch::{ChangelogFetcher, IssueFetcher};
use crate::table::ResultTable;

/// Fetch and export JIRA data.
#[derive(Debug, Parser)]
#[command(name = "jira-export", version, about = "Fetch and analyze JIRA data")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch project issues
    Issues(FetchArgs),
    /// Fetch project changelog
    Changelog(FetchArgs),
}

/// Options shared by both commands.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// JIRA project key
    pub project: String,

    /// Output file path (prints a table to stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Additional JQL filter
    #[arg(short = 'f', long = "filter", value_name = "JQL")]
    pub filter: Option<String>,

    /// Output file format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

/// Run the parsed command line and map the outcome to an exit code.
pub async fn run(cli: Cli) -> ExitCode {
    let Some(command) = cli.command else {
        // Mirror `--help` when no command is given.
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    ExitCode::from(run_command(&command, &mut stdout, &mut stderr).await)
}

/// Process exit status on success.
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status for any tool error.
pub const EXIT_FAILURE: u8 = 1;

/// Run a command with settings from the environment, writing any error to `err`.
///
/// Returns the process exit status.
pub async fn run_command<W: Write, E: Write>(
    command: &Command,
    out: &mut W,
    err: &mut E,
) -> u8 {
    let result = run_with_env(command, out, err).await;
    report(result, err)
}

fn report<E: Write>(result: Result<()>, err: &mut E) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Build settings from the environment, open a session, and execute.
///
/// The session is released when it goes out of scope, including on errors.
async fn run_with_env<W: Write, E: Write>(
    command: &Command,
    out: &mut W,
    err: &mut E,
) -> Result<()> {
    let settings = ConnectionSettings::from_env()?;
    info!("Loaded settings: {}", settings);
    let page_size = settings.page_size();

    let mut session = JiraSession::open(settings).await?;
    execute(&mut session, command, page_size, out, err).await
}

/// Execute a command against an issue source.
///
/// Results go to `out` (or the `--output` file); the empty-result notice goes
/// to `err`.
pub async fn execute<S, W, E>(
    source: &mut S,
    command: &Command,
    page_size: u32,
    out: &mut W,
    err: &mut E,
) -> Result<()>
where
    S: IssueSource,
    W: Write,
    E: Write,
{
    match command {
        Command::Issues(args) => {
            let table = IssueFetcher::new(source, page_size)?
                .fetch_project(&args.project, args.filter.as_deref(), None)
                .await?;
            emit(&table, args, "issues", "No issues found.", out, err)
        }
        Command::Changelog(args) => {
            let table = ChangelogFetcher::new(source)
                .fetch_for_project(&args.project, args.filter.as_deref(), page_size)
                .await?;
            emit(
                &table,
                args,
                "changelog entries",
                "No changelog entries found.",
                out,
                err,
            )
        }
    }
}

fn emit<W: Write, E: Write>(
    table: &ResultTable,
    args: &FetchArgs,
    noun: &str,
    empty_notice: &str,
    out: &mut W,
    err: &mut E,
) -> Result<()> {
    if table.is_empty() {
        writeln!(err, "{}", empty_notice).map_err(io_error)?;
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            save(table, path, args.format)?;
            writeln!(out, "Saved {} {} to {}", table.len(), noun, path.display())
                .map_err(io_error)?;
        }
        None => {
            writeln!(out, "{}", export::render_text(table)).map_err(io_error)?;
        }
    }
    Ok(())
}

fn save(table: &ResultTable, path: &Path, format: OutputFormat) -> Result<()> {
    export::write_table(table, path, format)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn io_error(e: std::io::Error) -> ToolError {
    ToolError::Export(ExportError::Io(e))
}
