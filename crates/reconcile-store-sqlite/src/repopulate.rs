// crates/reconcile-store-sqlite/src/repopulate.rs
// ============================================================================
// Module: Repopulation Executor
// Description: Copy backup rows into a recreated table through shared columns.
// Purpose: Carry data across a schema change or leave the table empty.
// Dependencies: reconcile-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! The executor runs inside the caller's transaction. Rows are inserted one
//! parameterized statement at a time and grouped into batches; each batch is a
//! savepoint released once it holds `batch_size` rows.
//!
//! When any insert or read fails, the open batch is rolled back, every row
//! already copied into the table is deleted, and the table is reported as
//! [`TransitionOutcome::DegradedEmpty`]. Only a failure of that cleanup delete
//! is returned as an error, because the table could otherwise stay half full.
//!
//! [`TransitionOutcome::DegradedEmpty`]: reconcile_core::TransitionOutcome::DegradedEmpty

// ============================================================================
// SECTION: Imports
// ============================================================================

use reconcile_core::BatchSize;
use reconcile_core::ColumnIntersection;
use reconcile_core::InsertStatement;
use reconcile_core::TableReport;
use reconcile_core::TransitionEvent;
use reconcile_core::TransitionObserver;
use reconcile_core::statement::delete_rows_sql;
use reconcile_core::statement::select_all_sql;
use rusqlite::Connection;
use rusqlite::Statement;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::rows::BackupRows;
use crate::rows::read_row_shape;
use crate::store::ReconcileError;
use crate::store::db_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Savepoint wrapping one batch of inserted rows.
const BEGIN_BATCH_SQL: &str = "SAVEPOINT reconcile_batch";
/// Keeps the rows of a completed batch.
const RELEASE_BATCH_SQL: &str = "RELEASE SAVEPOINT reconcile_batch";
/// Discards the rows of a failed batch and closes its savepoint.
const ABANDON_BATCH_SQL: &str =
    "ROLLBACK TO SAVEPOINT reconcile_batch; RELEASE SAVEPOINT reconcile_batch;";

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Repopulates recreated tables from their backups.
pub struct Repopulator<'a> {
    /// Maximum rows per batch savepoint.
    batch_size: BatchSize,
    /// Receives per-table events.
    observer: &'a dyn TransitionObserver,
}

impl<'a> Repopulator<'a> {
    /// Creates an executor with a resolved batch size.
    #[must_use]
    pub const fn new(batch_size: BatchSize, observer: &'a dyn TransitionObserver) -> Self {
        Self {
            batch_size,
            observer,
        }
    }

    /// Copies `backup` into `table` through their shared columns.
    ///
    /// Store faults while copying degrade the table to empty and are reported,
    /// not returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] only when a degraded table cannot be emptied.
    pub fn repopulate(
        &self,
        connection: &Connection,
        table: &str,
        backup: &str,
    ) -> Result<TableReport, ReconcileError> {
        let shared = match read_intersection(connection, table, backup) {
            Ok(shared) => shared,
            Err(err) => return self.degrade(connection, table, 0, &err),
        };
        match self.copy_rows(connection, table, backup, &shared) {
            Ok(rows) => {
                tracing::debug!(
                    table,
                    rows,
                    shared_columns = shared.len(),
                    "table repopulated"
                );
                self.observer.record(&TransitionEvent::Repopulated {
                    table: table.to_string(),
                    rows,
                });
                Ok(TableReport::repopulated(table, rows, shared.len()))
            }
            Err(err) => self.degrade(connection, table, shared.len(), &err),
        }
    }

    /// Empties `table` after a copy fault and reports it degraded.
    fn degrade(
        &self,
        connection: &Connection,
        table: &str,
        shared_columns: usize,
        err: &ReconcileError,
    ) -> Result<TableReport, ReconcileError> {
        let message = err.to_string();
        tracing::warn!(table, error = %message, "repopulation failed; table left empty");
        connection.execute_batch(&delete_rows_sql(table)).map_err(db_error)?;
        self.observer.record(&TransitionEvent::Degraded {
            table: table.to_string(),
            message: message.clone(),
        });
        Ok(TableReport::degraded(table, shared_columns, message))
    }

    /// Streams backup rows into `table` in batches and returns the count.
    fn copy_rows(
        &self,
        connection: &Connection,
        table: &str,
        backup: &str,
        shared: &ColumnIntersection,
    ) -> Result<u64, ReconcileError> {
        if shared.is_empty() {
            return Ok(0);
        }
        let mut select = connection.prepare(&select_all_sql(backup)).map_err(db_error)?;
        let mut rows = BackupRows::open(&mut select, shared)?.peekable();
        if rows.peek().is_none() {
            return Ok(0);
        }
        let insert = InsertStatement::build(table, shared)?;
        let mut statement = connection.prepare(insert.sql()).map_err(db_error)?;
        let mut copied = 0u64;
        let mut pending = 0usize;
        let mut failure = None;
        for row in rows.by_ref() {
            if pending == 0 {
                connection.execute_batch(BEGIN_BATCH_SQL).map_err(db_error)?;
            }
            if let Err(err) = row.and_then(|values| insert_row(&mut statement, &insert, &values)) {
                failure = Some(err);
                break;
            }
            copied += 1;
            pending += 1;
            if pending == self.batch_size.get() {
                connection.execute_batch(RELEASE_BATCH_SQL).map_err(db_error)?;
                pending = 0;
            }
        }
        // The backup cursor must be closed before the savepoint is rolled back.
        drop(rows);
        drop(select);
        if let Some(err) = failure {
            return Err(abandon_batch(connection, err));
        }
        if pending > 0 {
            connection.execute_batch(RELEASE_BATCH_SQL).map_err(db_error)?;
        }
        Ok(copied)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads both shapes and intersects them in backup column order.
fn read_intersection(
    connection: &Connection,
    table: &str,
    backup: &str,
) -> Result<ColumnIntersection, ReconcileError> {
    let old_shape = read_row_shape(connection, backup)?;
    let new_shape = read_row_shape(connection, table)?;
    Ok(ColumnIntersection::between(&old_shape, &new_shape))
}

/// Executes the insert for one projected row.
fn insert_row(
    statement: &mut Statement<'_>,
    insert: &InsertStatement,
    values: &[Value],
) -> Result<(), ReconcileError> {
    if values.len() != insert.column_count() {
        return Err(ReconcileError::Invalid(format!(
            "row has {} values for {} columns",
            values.len(),
            insert.column_count()
        )));
    }
    statement.execute(params_from_iter(values)).map_err(db_error)?;
    Ok(())
}

/// Rolls back the open batch, keeping the original failure as the cause.
fn abandon_batch(connection: &Connection, cause: ReconcileError) -> ReconcileError {
    match connection.execute_batch(ABANDON_BATCH_SQL) {
        Ok(()) => cause,
        Err(rollback) => ReconcileError::Db(format!("{cause}; batch rollback failed: {rollback}")),
    }
}
