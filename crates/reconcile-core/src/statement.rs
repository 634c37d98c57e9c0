// crates/reconcile-core/src/statement.rs
// ============================================================================
// Module: Statement Builder
// Description: SQL text for backups, drops, and parameterized inserts.
// Purpose: Keep column and placeholder counts equal by construction.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every statement the reconciler issues against a named table is built here.
//! Identifiers are always double-quoted so table and column names are never
//! interpreted as SQL. [`InsertStatement::build`] refuses an empty column list
//! instead of emitting `INSERT INTO t() VALUES()`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::columns::ColumnIntersection;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Statement builder errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// An insert was requested with no columns.
    #[error("insert into {table} has no columns")]
    EmptyColumnList {
        /// Target table name.
        table: String,
    },
}

// ============================================================================
// SECTION: Insert Statement
// ============================================================================

/// Parameterized insert with one positional placeholder per column.
///
/// # Invariants
/// - `column_count` equals the number of `?N` placeholders in `sql`.
/// - `column_count` is greater than zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// Rendered SQL text.
    sql: String,
    /// Number of columns and placeholders.
    column_count: usize,
}

impl InsertStatement {
    /// Builds `INSERT INTO "table" ("c1", ...) VALUES (?1, ...)` over the
    /// shared columns.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::EmptyColumnList`] when `columns` is empty.
    pub fn build(table: &str, columns: &ColumnIntersection) -> Result<Self, StatementError> {
        Self::from_columns(table, columns.columns())
    }

    /// Builds an insert over an explicit ordered column list.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::EmptyColumnList`] when `columns` is empty.
    pub fn from_columns(table: &str, columns: &[String]) -> Result<Self, StatementError> {
        if columns.is_empty() {
            return Err(StatementError::EmptyColumnList {
                table: table.to_string(),
            });
        }
        let column_clause =
            columns.iter().map(|column| quote_identifier(column)).collect::<Vec<_>>().join(", ");
        let placeholders =
            (1 ..= columns.len()).map(|index| format!("?{index}")).collect::<Vec<_>>().join(", ");
        Ok(Self {
            sql: format!(
                "INSERT INTO {} ({column_clause}) VALUES ({placeholders})",
                quote_identifier(table)
            ),
            column_count: columns.len(),
        })
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the number of bound parameters the statement expects.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }
}

// ============================================================================
// SECTION: Table Statements
// ============================================================================

/// Quotes an identifier for `SQLite`, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE "backup" AS SELECT * FROM "table"`.
#[must_use]
pub fn copy_table_sql(table: &str, backup: &str) -> String {
    format!("CREATE TABLE {} AS SELECT * FROM {}", quote_identifier(backup), quote_identifier(table))
}

/// `DROP TABLE IF EXISTS "table"`.
#[must_use]
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
}

/// `DELETE FROM "table"`.
#[must_use]
pub fn delete_rows_sql(table: &str) -> String {
    format!("DELETE FROM {}", quote_identifier(table))
}

/// `SELECT * FROM "table"` in insertion order.
#[must_use]
pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {} ORDER BY rowid", quote_identifier(table))
}

/// `SELECT * FROM "table"` without ordering; used only to read column names.
#[must_use]
pub fn shape_probe_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
