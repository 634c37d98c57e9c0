// crates/reconcile-cli/src/render.rs
// ============================================================================
// Module: CLI Output Rendering
// Description: Output payloads and their text rendering.
// Purpose: Keep the JSON and text views of a command in one place.
// Dependencies: reconcile-core, reconcile-store-sqlite, serde
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use reconcile_core::TransitionOutcome;
use reconcile_core::TransitionReport;
use reconcile_store_sqlite::StoreStatus;
use serde::Serialize;

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Result of `reconcile migrate`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MigrateOutput {
    /// Store path as configured.
    pub store: String,
    /// Stored version after opening.
    pub version: u32,
    /// Transition run while opening, if any.
    pub transition: Option<TransitionReport>,
}

/// Result of `reconcile status`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatusOutput {
    /// Store path as configured.
    pub store: String,
    /// Stored and declared state.
    #[serde(flatten)]
    pub status: StoreStatus,
}

// ============================================================================
// SECTION: Text Rendering
// ============================================================================

/// Renders the migrate result as text.
pub(crate) fn render_migrate_text(output: &MigrateOutput) -> String {
    let mut text = format!("store: {}\n", output.store);
    let Some(report) = &output.transition else {
        let _ = write!(text, "schema already at version {}", output.version);
        return text;
    };
    let _ = write!(
        text,
        "{}: version {} -> {}",
        report.kind.as_str(),
        report.from_version,
        report.to_version
    );
    for table in &report.tables {
        let _ = write!(text, "\n  {}: {}", table.table, table.outcome.as_str());
        match table.outcome {
            TransitionOutcome::Repopulated => {
                let _ = write!(
                    text,
                    " ({} rows, {} shared columns)",
                    table.rows_copied, table.shared_columns
                );
            }
            TransitionOutcome::DegradedEmpty => {
                let fault = table.fault.as_deref().unwrap_or("unknown fault");
                let _ = write!(text, " ({fault})");
            }
        }
    }
    text
}

/// Renders the status result as text.
pub(crate) fn render_status_text(output: &StatusOutput) -> String {
    let status = &output.status;
    let mut text = format!(
        "store: {}\nstored version: {}\ndeclared version: {}",
        output.store, status.stored_version, status.declared_version
    );
    for table in &status.tables {
        match table.rows {
            Some(rows) if table.present => {
                let _ = write!(text, "\n  {}: present ({rows} rows)", table.table);
            }
            _ => {
                let _ = write!(text, "\n  {}: absent", table.table);
            }
        }
    }
    text
}
