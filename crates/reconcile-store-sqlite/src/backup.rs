// crates/reconcile-store-sqlite/src/backup.rs
// ============================================================================
// Module: Backup Table Manager
// Description: Create and drop the per-table backup copies of a transition.
// Purpose: Hold a table's rows while its schema is recreated.
// Dependencies: reconcile-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! A backup is `CREATE TABLE <table><suffix> AS SELECT * FROM <table>`. It keeps
//! column names and rows, not constraints. A real table that already carries
//! the backup name collides with the backup; that is a known limitation and is
//! not detected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reconcile_core::schema::backup_table_name;
use reconcile_core::statement::copy_table_sql;
use reconcile_core::statement::drop_table_sql;
use rusqlite::Connection;

use crate::store::ReconcileError;
use crate::store::db_error;

// ============================================================================
// SECTION: Backup Operations
// ============================================================================

/// Copies `table` into its backup table and returns the backup name.
///
/// The caller drops `table` afterwards.
///
/// # Errors
///
/// Returns [`ReconcileError::Db`] when the store rejects the copy.
pub fn create_backup(
    connection: &Connection,
    table: &str,
    suffix: &str,
) -> Result<String, ReconcileError> {
    let backup = backup_table_name(table, suffix);
    connection.execute_batch(&copy_table_sql(table, &backup)).map_err(db_error)?;
    tracing::debug!(table, backup = %backup, "table copied to backup");
    Ok(backup)
}

/// Drops `name` if it exists; absent tables are not an error.
///
/// # Errors
///
/// Returns [`ReconcileError::Db`] when the drop itself fails.
pub fn drop_if_exists(connection: &Connection, name: &str) -> Result<(), ReconcileError> {
    connection.execute_batch(&drop_table_sql(name)).map_err(db_error)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
