// crates/reconcile-core/src/report.rs
// ============================================================================
// Module: Transition Reports
// Description: Per-table outcomes of a schema transition.
// Purpose: Summarize what a transition preserved and what it dropped.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Reports are not persisted. They are returned to the caller and serialized by
//! the CLI so operators can see which tables degraded to empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// First creation of the schema.
    Create,
    /// Stored version lower than declared.
    Upgrade,
    /// Stored version higher than declared.
    Downgrade,
}

impl TransitionKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
        }
    }
}

/// Result of repopulating one table from its backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Backup rows were carried into the recreated table.
    Repopulated,
    /// Repopulation failed; the table was left empty.
    DegradedEmpty,
}

impl TransitionOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repopulated => "repopulated",
            Self::DegradedEmpty => "degraded_empty",
        }
    }
}

/// Outcome for a single table that had a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    /// Table name.
    pub table: String,
    /// Repopulation outcome.
    pub outcome: TransitionOutcome,
    /// Rows inserted and kept.
    pub rows_copied: u64,
    /// Number of columns shared by the old and new shapes.
    pub shared_columns: usize,
    /// Store fault message when the table degraded.
    pub fault: Option<String>,
}

impl TableReport {
    /// Builds a report for a successfully repopulated table.
    #[must_use]
    pub fn repopulated(table: &str, rows_copied: u64, shared_columns: usize) -> Self {
        Self {
            table: table.to_string(),
            outcome: TransitionOutcome::Repopulated,
            rows_copied,
            shared_columns,
            fault: None,
        }
    }

    /// Builds a report for a table left empty after a store fault.
    #[must_use]
    pub fn degraded(table: &str, shared_columns: usize, fault: String) -> Self {
        Self {
            table: table.to_string(),
            outcome: TransitionOutcome::DegradedEmpty,
            rows_copied: 0,
            shared_columns,
            fault: Some(fault),
        }
    }
}

/// Summary of one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// Transition direction.
    pub kind: TransitionKind,
    /// Stored version before the transition (zero for a fresh store).
    pub from_version: u32,
    /// Declared version recorded by the transition.
    pub to_version: u32,
    /// Reports for every table that had a backup, in declaration order.
    pub tables: Vec<TableReport>,
}

impl TransitionReport {
    /// Returns the tables that degraded to empty.
    pub fn degraded(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|table| table.outcome == TransitionOutcome::DegradedEmpty)
    }

    /// Returns the report for `table`, if it had a backup.
    #[must_use]
    pub fn table(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|report| report.table.eq_ignore_ascii_case(table))
    }
}
