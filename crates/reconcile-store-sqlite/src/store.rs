// crates/reconcile-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Schema Store
// Description: Connection lifecycle for a reconciled SQLite database.
// Purpose: Open the store and run the transition its stored version requires.
// Dependencies: reconcile-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteSchemaStore::open`] validates the store path, opens a connection with
//! the configured pragmas, and hands it to the [`Reconciler`] which compares
//! `PRAGMA user_version` against the declared version. The store owns its
//! connection; dropping or closing the store releases it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use reconcile_core::SchemaDeclaration;
use reconcile_core::SchemaError;
use reconcile_core::StatementError;
use reconcile_core::TransitionReport;
use reconcile_core::statement::quote_identifier;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::controller::Reconciler;
use crate::controller::stored_version;
use crate::probe::probe_table;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` schema store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default pragmas.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema store and reconciliation errors.
///
/// # Invariants
/// - Error messages never embed row values.
#[derive(Debug, Error, Clone)]
pub enum ReconcileError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored or requested version is unusable.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Schema declaration rejected.
    #[error("sqlite store schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Statement could not be built.
    #[error("sqlite store statement error: {0}")]
    Statement(#[from] StatementError),
}

/// Maps a `rusqlite` error into [`ReconcileError::Db`].
pub(crate) fn db_error(error: rusqlite::Error) -> ReconcileError {
    ReconcileError::Db(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Reconciled `SQLite` database handle.
///
/// # Invariants
/// - After `open` returns, the stored version equals the declared version.
pub struct SqliteSchemaStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Owned connection.
    connection: Connection,
    /// Transition run while opening, if the version differed.
    last_transition: Option<TransitionReport>,
}

/// Stored vs declared state of a database, gathered without reconciling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// `user_version` currently stored (zero for a missing or fresh file).
    pub stored_version: u32,
    /// Version the declaration expects.
    pub declared_version: u32,
    /// Declared tables in declaration order.
    pub tables: Vec<TableStatus>,
}

/// Presence and size of one declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    /// Table name.
    pub table: String,
    /// Whether the table exists.
    pub present: bool,
    /// Row count when present.
    pub rows: Option<u64>,
}

impl SqliteSchemaStore {
    /// Opens the store and reconciles its schema to the declared version.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the path is invalid, the database cannot
    /// be opened, or the transition fails fatally (nothing is committed).
    pub fn open(config: SqliteStoreConfig, reconciler: &Reconciler) -> Result<Self, ReconcileError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        let last_transition = reconciler.reconcile(&mut connection)?;
        Ok(Self {
            config,
            connection,
            last_transition,
        })
    }

    /// Reports stored and declared state without modifying the database.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the path is invalid or a query fails.
    pub fn inspect(
        config: &SqliteStoreConfig,
        declaration: &SchemaDeclaration,
    ) -> Result<StoreStatus, ReconcileError> {
        validate_store_path(&config.path)?;
        let declared_version = declaration.version().get();
        if !config.path.exists() {
            return Ok(StoreStatus {
                stored_version: 0,
                declared_version,
                tables: declaration
                    .table_names()
                    .map(|table| TableStatus {
                        table: table.to_string(),
                        present: false,
                        rows: None,
                    })
                    .collect(),
            });
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
        connection
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(db_error)?;
        let stored_version = stored_version(&connection)?;
        let mut tables = Vec::new();
        for table in declaration.table_names() {
            let present = probe_table(&connection, table)?.exists();
            let rows = if present { Some(count_rows(&connection, table)?) } else { None };
            tables.push(TableStatus {
                table: table.to_string(),
                present,
                rows,
            });
        }
        Ok(StoreStatus {
            stored_version,
            declared_version,
            tables,
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the underlying connection mutably.
    pub const fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Returns the transition run while opening, if any.
    #[must_use]
    pub const fn last_transition(&self) -> Option<&TransitionReport> {
        self.last_transition.as_ref()
    }

    /// Returns the stored `user_version`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the pragma cannot be read.
    pub fn schema_version(&self) -> Result<u32, ReconcileError> {
        stored_version(&self.connection)
    }

    /// Closes the connection, surfacing any close error.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Db`] when `SQLite` refuses to close.
    pub fn close(self) -> Result<(), ReconcileError> {
        self.connection.close().map_err(|(_, err)| db_error(err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), ReconcileError> {
    let Some(parent) = path.parent() else {
        return Err(ReconcileError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| ReconcileError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), ReconcileError> {
    if path.as_os_str().is_empty() {
        return Err(ReconcileError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ReconcileError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ReconcileError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(ReconcileError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens a writable `SQLite` connection with configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, ReconcileError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), ReconcileError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Counts the rows of `table`.
fn count_rows(connection: &Connection, table: &str) -> Result<u64, ReconcileError> {
    let count: i64 = connection
        .query_row(&format!("SELECT COUNT(*) FROM {}", quote_identifier(table)), [], |row| {
            row.get(0)
        })
        .map_err(db_error)?;
    u64::try_from(count).map_err(|_| ReconcileError::Invalid(format!("negative row count for {table}")))
}
