// crates/reconcile-core/src/schema.rs
// ============================================================================
// Module: Schema Declaration
// Description: Declared tables, create statements, and removed tables.
// Purpose: Validate the caller's schema once so transitions can trust it.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`SchemaDeclaration`] is the ordered list of tables an application expects
//! at a given version, each with the `CREATE TABLE IF NOT EXISTS` statement that
//! produces it, plus the deprecated tables that must be dropped before the
//! schema is recreated. Table names compare ASCII case-insensitively, matching
//! `SQLite` identifier resolution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix appended to a table name to form its backup table name.
pub const DEFAULT_BACKUP_SUFFIX: &str = "_temp";

/// Largest schema version `PRAGMA user_version` can hold.
pub const MAX_SCHEMA_VERSION: u32 = i32::MAX.unsigned_abs();

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema declaration validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Schema versions start at one.
    #[error("schema version must be greater than zero")]
    ZeroVersion,
    /// The version does not fit the store's signed 32-bit version slot.
    #[error("schema version {0} exceeds maximum 2147483647")]
    VersionTooLarge(u32),
    /// The declaration lists no tables.
    #[error("schema declares no tables")]
    NoTables,
    /// A table or removed-table name is empty or contains NUL.
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),
    /// A table name is declared more than once.
    #[error("duplicate table name: {0}")]
    DuplicateTable(String),
    /// A table has an empty create statement.
    #[error("table {0} has an empty create statement")]
    EmptyCreateStatement(String),
    /// A table is declared both live and removed.
    #[error("table {0} is both declared and marked removed")]
    RemovedTableDeclared(String),
    /// The backup suffix is empty.
    #[error("backup suffix must not be empty")]
    EmptyBackupSuffix,
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Schema version stored alongside the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SchemaVersion(NonZeroU32);

impl SchemaVersion {
    /// Creates a schema version from a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ZeroVersion`] when `raw` is zero and
    /// [`SchemaError::VersionTooLarge`] when `raw` exceeds
    /// [`MAX_SCHEMA_VERSION`].
    pub const fn new(raw: u32) -> Result<Self, SchemaError> {
        if raw > MAX_SCHEMA_VERSION {
            return Err(SchemaError::VersionTooLarge(raw));
        }
        match NonZeroU32::new(raw) {
            Some(value) => Ok(Self(value)),
            None => Err(SchemaError::ZeroVersion),
        }
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = SchemaError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SchemaVersion> for u32 {
    fn from(value: SchemaVersion) -> Self {
        value.get()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A declared table and the statement that creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// `CREATE TABLE IF NOT EXISTS` statement for the table.
    pub create_statement: String,
}

impl TableSpec {
    /// Creates a table spec.
    #[must_use]
    pub fn new(name: impl Into<String>, create_statement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            create_statement: create_statement.into(),
        }
    }
}

/// Validated schema declaration for one version.
///
/// # Invariants
/// - At least one table is declared.
/// - Table names are non-empty, NUL-free, and unique ignoring ASCII case.
/// - No removed table is also declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDeclaration {
    /// Declared schema version.
    version: SchemaVersion,
    /// Tables in creation order.
    tables: Vec<TableSpec>,
    /// Tables dropped unconditionally before recreation.
    removed_tables: Vec<String>,
}

impl SchemaDeclaration {
    /// Validates and builds a schema declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when any declaration invariant is violated.
    pub fn new(
        version: SchemaVersion,
        tables: Vec<TableSpec>,
        removed_tables: Vec<String>,
    ) -> Result<Self, SchemaError> {
        if tables.is_empty() {
            return Err(SchemaError::NoTables);
        }
        let mut seen = BTreeSet::new();
        for table in &tables {
            validate_table_name(&table.name)?;
            if !seen.insert(table.name.to_ascii_lowercase()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
            if table.create_statement.trim().is_empty() {
                return Err(SchemaError::EmptyCreateStatement(table.name.clone()));
            }
        }
        for removed in &removed_tables {
            validate_table_name(removed)?;
            if seen.contains(&removed.to_ascii_lowercase()) {
                return Err(SchemaError::RemovedTableDeclared(removed.clone()));
            }
        }
        Ok(Self {
            version,
            tables,
            removed_tables,
        })
    }

    /// Returns the declared schema version.
    #[must_use]
    pub const fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Returns the declared tables in creation order.
    #[must_use]
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Returns the tables dropped before recreation.
    #[must_use]
    pub fn removed_tables(&self) -> &[String] {
        &self.removed_tables
    }

    /// Returns the declared table names in creation order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name.as_str())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects empty names and names containing NUL.
fn validate_table_name(name: &str) -> Result<(), SchemaError> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(SchemaError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// Validates a backup suffix.
///
/// # Errors
///
/// Returns [`SchemaError::EmptyBackupSuffix`] when the suffix is empty.
pub fn validate_backup_suffix(suffix: &str) -> Result<(), SchemaError> {
    if suffix.is_empty() || suffix.contains('\0') {
        return Err(SchemaError::EmptyBackupSuffix);
    }
    Ok(())
}

/// Returns the backup table name for `table`.
#[must_use]
pub fn backup_table_name(table: &str, suffix: &str) -> String {
    format!("{table}{suffix}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
