// crates/reconcile-store-sqlite/src/rows.rs
// ============================================================================
// Module: Backup Row Stream
// Description: Row shapes and a one-pass stream of backup rows.
// Purpose: Feed repopulation typed values in shared-column order.
// Dependencies: reconcile-core, rusqlite
// ============================================================================

//! ## Overview
//! [`read_row_shape`] prepares `SELECT *` only to read the column names and
//! drops the statement before returning. [`BackupRows`] wraps an open query and
//! yields, per row, the values of the shared columns in intersection order. The
//! stream is finite and not restartable; it stops after the first error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reconcile_core::ColumnIntersection;
use reconcile_core::RowShape;
use reconcile_core::statement::shape_probe_sql;
use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Rows;
use rusqlite::Statement;
use rusqlite::types::Value;

use crate::store::ReconcileError;
use crate::store::db_error;

// ============================================================================
// SECTION: Row Shape
// ============================================================================

/// Reads the current column names of `table`.
///
/// # Errors
///
/// Returns [`ReconcileError::Db`] when the table cannot be prepared against.
pub fn read_row_shape(connection: &Connection, table: &str) -> Result<RowShape, ReconcileError> {
    let statement = connection.prepare(&shape_probe_sql(table)).map_err(db_error)?;
    Ok(RowShape::new(statement.column_names()))
}

// ============================================================================
// SECTION: Row Stream
// ============================================================================

/// Lazy stream of backup rows projected onto the shared columns.
pub struct BackupRows<'stmt> {
    /// Open query over the backup table.
    rows: Rows<'stmt>,
    /// Backup column positions to extract, in intersection order.
    indices: Vec<usize>,
    /// Set once the query is exhausted or has failed.
    finished: bool,
}

impl<'stmt> BackupRows<'stmt> {
    /// Starts the query prepared in `statement`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Db`] when the query cannot start.
    pub fn open(
        statement: &'stmt mut Statement<'_>,
        shared: &ColumnIntersection,
    ) -> Result<Self, ReconcileError> {
        let rows = statement.query([]).map_err(db_error)?;
        Ok(Self {
            rows,
            indices: shared.source_indices().to_vec(),
            finished: false,
        })
    }
}

impl Iterator for BackupRows<'_> {
    type Item = Result<Vec<Value>, ReconcileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = match self.rows.next() {
            Ok(Some(row)) => Some(project_row(row, &self.indices)),
            Ok(None) => None,
            Err(err) => Some(Err(db_error(err))),
        };
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

/// Extracts the values at `indices` from `row`.
fn project_row(row: &Row<'_>, indices: &[usize]) -> Result<Vec<Value>, ReconcileError> {
    indices.iter().map(|&index| row.get::<_, Value>(index).map_err(db_error)).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
