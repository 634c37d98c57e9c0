// crates/reconcile-cli/src/main.rs
// ============================================================================
// Module: Schema Reconcile CLI Entry Point
// Description: Command dispatcher for schema migration and status checks.
// Purpose: Reconcile a configured SQLite store from the command line.
// Dependencies: clap, reconcile-config, reconcile-store-sqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `reconcile migrate` opens the configured store, which runs whatever
//! transition the stored version requires, and prints the transition report.
//! `reconcile status` reports the stored and declared versions and the declared
//! tables without modifying the store. Logs go to stderr; results go to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod logging;
mod render;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use reconcile_config::ReconcileConfig;
use reconcile_store_sqlite::SqliteSchemaStore;
use serde::Serialize;
use thiserror::Error;

use crate::logging::init_logging;
use crate::render::MigrateOutput;
use crate::render::StatusOutput;
use crate::render::render_migrate_text;
use crate::render::render_status_text;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "reconcile", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the store schema to the declared version.
    Migrate(CommandArgs),
    /// Show stored and declared state without reconciling.
    Status(CommandArgs),
}

/// Arguments shared by every subcommand.
#[derive(Args, Debug)]
struct CommandArgs {
    /// Path to reconcile.toml (falls back to `RECONCILE_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output format selection.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Pretty-printed JSON output.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate(args) => command_migrate(&args),
        Commands::Status(args) => command_status(&args),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs `reconcile migrate`.
fn command_migrate(args: &CommandArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let reconciler = config.reconciler().map_err(|err| CliError::new(err.to_string()))?;
    let store_config = config.store_config();
    let store = SqliteSchemaStore::open(store_config.clone(), &reconciler)
        .map_err(|err| CliError::new(format!("migration failed: {err}")))?;
    let output = MigrateOutput {
        store: store_config.path.display().to_string(),
        version: store.schema_version().map_err(|err| CliError::new(err.to_string()))?,
        transition: store.last_transition().cloned(),
    };
    store.close().map_err(|err| CliError::new(err.to_string()))?;
    match args.format {
        OutputFormat::Json => write_json(&output)?,
        OutputFormat::Text => write_stdout_text(&render_migrate_text(&output))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Runs `reconcile status`.
fn command_status(args: &CommandArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let declaration = config.declaration().map_err(|err| CliError::new(err.to_string()))?;
    let store_config = config.store_config();
    let status = SqliteSchemaStore::inspect(&store_config, &declaration)
        .map_err(|err| CliError::new(format!("status failed: {err}")))?;
    let output = StatusOutput {
        store: store_config.path.display().to_string(),
        status,
    };
    match args.format {
        OutputFormat::Json => write_json(&output)?,
        OutputFormat::Text => write_stdout_text(&render_status_text(&output))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration and installs the log subscriber.
fn load_config(args: &CommandArgs) -> CliResult<ReconcileConfig> {
    let config = ReconcileConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    init_logging(&config.logging.level).map_err(CliError::new)?;
    if let Some(path) = &config.source_path {
        tracing::debug!(config = %path.display(), "configuration loaded");
    }
    if let Some(ceiling) = config.batch.effective_ceiling_mb() {
        tracing::debug!(
            ceiling_mb = ceiling,
            batch_rows = config.options().batch_size.get(),
            "batch size resolved"
        );
    }
    Ok(config)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to encode json output: {err}")))?;
    write_stdout_text(&text)
}

/// Writes text to stdout with a trailing newline.
fn write_stdout_text(text: &str) -> CliResult<()> {
    write_stdout_line(text).map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
