// crates/reconcile-store-sqlite/src/probe.rs
// ============================================================================
// Module: Table Existence Probe
// Description: Structural check for a table in the SQLite schema.
// Purpose: Tell "missing" apart from "store fault" without parsing errors.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Existence is read from `sqlite_master`. A table that is not listed is
//! [`TablePresence::Absent`]; any failure to run the lookup is a store fault and
//! propagates, since a locked or corrupt store must not look like a fresh one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::store::ReconcileError;
use crate::store::db_error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Whether a table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePresence {
    /// The table exists.
    Present,
    /// The table does not exist.
    Absent,
}

impl TablePresence {
    /// Returns true for [`TablePresence::Present`].
    #[must_use]
    pub const fn exists(self) -> bool {
        matches!(self, Self::Present)
    }
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Looks `name` up in the schema catalog (ASCII case-insensitive).
///
/// # Errors
///
/// Returns [`ReconcileError::Db`] when the catalog cannot be queried.
pub fn probe_table(connection: &Connection, name: &str) -> Result<TablePresence, ReconcileError> {
    let found: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_error)?;
    Ok(if found.is_some() { TablePresence::Present } else { TablePresence::Absent })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
