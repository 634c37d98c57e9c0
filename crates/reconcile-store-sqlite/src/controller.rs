// crates/reconcile-store-sqlite/src/controller.rs
// ============================================================================
// Module: Version Transition Controller
// Description: Create, upgrade, and downgrade entry points for a declared schema.
// Purpose: Run backup, recreate, and repopulate as one atomic transition.
// Dependencies: reconcile-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! A transition backs up every declared table that exists, drops the removed
//! tables, executes every declared create statement, repopulates each backed-up
//! table, drops the backups, and records the declared version in
//! `PRAGMA user_version`, all in one transaction. Upgrade and downgrade run the
//! same steps.
//!
//! Failures while backing up, creating, or recording the version roll the
//! transaction back. Repopulation faults only empty the affected table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::sync::Arc;

use reconcile_core::BatchSize;
use reconcile_core::DEFAULT_BACKUP_SUFFIX;
use reconcile_core::NoopObserver;
use reconcile_core::SchemaDeclaration;
use reconcile_core::SchemaVersion;
use reconcile_core::TransitionEvent;
use reconcile_core::TransitionKind;
use reconcile_core::TransitionObserver;
use reconcile_core::TransitionReport;
use reconcile_core::schema::backup_table_name;
use reconcile_core::schema::validate_backup_suffix;
use rusqlite::Connection;

use crate::backup::create_backup;
use crate::backup::drop_if_exists;
use crate::probe::probe_table;
use crate::repopulate::Repopulator;
use crate::store::ReconcileError;
use crate::store::db_error;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Tunables for a reconciler, resolved before any transition runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Suffix forming backup table names.
    pub backup_suffix: String,
    /// Maximum rows per repopulation batch.
    pub batch_size: BatchSize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            batch_size: BatchSize::default(),
        }
    }
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Drives schema transitions for one declaration.
pub struct Reconciler {
    /// Declared target schema.
    declaration: SchemaDeclaration,
    /// Backup suffix and batch size.
    options: ReconcileOptions,
    /// Receives transition events.
    observer: Arc<dyn TransitionObserver>,
}

impl Reconciler {
    /// Creates a reconciler with a no-op observer.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Schema`] when the backup suffix is empty.
    pub fn new(
        declaration: SchemaDeclaration,
        options: ReconcileOptions,
    ) -> Result<Self, ReconcileError> {
        validate_backup_suffix(&options.backup_suffix)?;
        Ok(Self {
            declaration,
            options,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Replaces the transition observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the declared schema.
    #[must_use]
    pub const fn declaration(&self) -> &SchemaDeclaration {
        &self.declaration
    }

    /// Returns the resolved options.
    #[must_use]
    pub const fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Compares the stored version with the declared one and runs the
    /// matching entry point. Returns `None` when they already agree.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the stored version cannot be read or the
    /// transition fails fatally.
    pub fn reconcile(
        &self,
        connection: &mut Connection,
    ) -> Result<Option<TransitionReport>, ReconcileError> {
        let stored = stored_version(connection)?;
        let declared = self.declaration.version();
        if stored == 0 {
            return self.on_create(connection).map(Some);
        }
        let report = match stored.cmp(&declared.get()) {
            Ordering::Less => self.on_upgrade(connection, stored, declared)?,
            Ordering::Greater => self.on_downgrade(connection, stored, declared)?,
            Ordering::Equal => return Ok(None),
        };
        Ok(Some(report))
    }

    /// Creates the declared schema on a fresh store.
    ///
    /// Removed tables are dropped first; every create statement must be
    /// idempotent (`IF NOT EXISTS`).
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when any statement fails; nothing is committed.
    pub fn on_create(&self, connection: &mut Connection) -> Result<TransitionReport, ReconcileError> {
        let to_version = self.declaration.version().get();
        self.observer.record(&TransitionEvent::Started {
            kind: TransitionKind::Create,
            from_version: 0,
            to_version,
        });
        let tx = connection.transaction().map_err(db_error)?;
        self.create_schema(&tx)?;
        set_stored_version(&tx, to_version)?;
        tx.commit().map_err(db_error)?;
        self.observer.record(&TransitionEvent::Committed {
            to_version,
        });
        tracing::info!(version = to_version, "schema created");
        Ok(TransitionReport {
            kind: TransitionKind::Create,
            from_version: 0,
            to_version,
            tables: Vec::new(),
        })
    }

    /// Upgrades the store from `old_version` to `new_version`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when `new_version` is not the declared
    /// version or the transition fails fatally.
    pub fn on_upgrade(
        &self,
        connection: &mut Connection,
        old_version: u32,
        new_version: SchemaVersion,
    ) -> Result<TransitionReport, ReconcileError> {
        self.transition(connection, TransitionKind::Upgrade, old_version, new_version)
    }

    /// Downgrades the store from `old_version` to `new_version`.
    ///
    /// Behaves exactly like [`Reconciler::on_upgrade`].
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when `new_version` is not the declared
    /// version or the transition fails fatally.
    pub fn on_downgrade(
        &self,
        connection: &mut Connection,
        old_version: u32,
        new_version: SchemaVersion,
    ) -> Result<TransitionReport, ReconcileError> {
        self.transition(connection, TransitionKind::Downgrade, old_version, new_version)
    }

    /// Recreates the declared schema and carries rows across from
    /// `old_version`, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when `new_version` is not the declared
    /// version, or when backing up, creating, dropping a backup, emptying a
    /// degraded table, or committing fails. Nothing is committed on error.
    pub fn transition(
        &self,
        connection: &mut Connection,
        kind: TransitionKind,
        old_version: u32,
        new_version: SchemaVersion,
    ) -> Result<TransitionReport, ReconcileError> {
        if new_version != self.declaration.version() {
            return Err(ReconcileError::VersionMismatch(format!(
                "target version {new_version} does not match declared version {}",
                self.declaration.version()
            )));
        }
        let to_version = new_version.get();
        self.observer.record(&TransitionEvent::Started {
            kind,
            from_version: old_version,
            to_version,
        });
        let tx = connection.transaction().map_err(db_error)?;
        for table in self.declaration.table_names() {
            if probe_table(&tx, table)?.exists() {
                create_backup(&tx, table, &self.options.backup_suffix)?;
                drop_if_exists(&tx, table)?;
                self.observer.record(&TransitionEvent::BackedUp {
                    table: table.to_string(),
                });
            }
        }
        self.create_schema(&tx)?;
        let repopulator = Repopulator::new(self.options.batch_size, self.observer.as_ref());
        let mut tables = Vec::new();
        for table in self.declaration.table_names() {
            let backup = backup_table_name(table, &self.options.backup_suffix);
            if probe_table(&tx, &backup)?.exists() {
                tables.push(repopulator.repopulate(&tx, table, &backup)?);
                drop_if_exists(&tx, &backup)?;
            }
        }
        set_stored_version(&tx, to_version)?;
        tx.commit().map_err(db_error)?;
        self.observer.record(&TransitionEvent::Committed {
            to_version,
        });
        let report = TransitionReport {
            kind,
            from_version: old_version,
            to_version,
            tables,
        };
        tracing::info!(
            kind = kind.as_str(),
            from = old_version,
            to = to_version,
            tables = report.tables.len(),
            degraded = report.degraded().count(),
            "schema transition committed"
        );
        Ok(report)
    }

    /// Drops removed tables, then runs every create statement in order.
    fn create_schema(&self, connection: &Connection) -> Result<(), ReconcileError> {
        for removed in self.declaration.removed_tables() {
            drop_if_exists(connection, removed)?;
        }
        for table in self.declaration.tables() {
            connection.execute_batch(&table.create_statement).map_err(db_error)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Version Helpers
// ============================================================================

/// Reads `PRAGMA user_version`.
///
/// # Errors
///
/// Returns [`ReconcileError`] when the pragma cannot be read or is negative.
pub fn stored_version(connection: &Connection) -> Result<u32, ReconcileError> {
    let raw: i64 = connection
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(db_error)?;
    u32::try_from(raw)
        .map_err(|_| ReconcileError::VersionMismatch(format!("unsupported stored version: {raw}")))
}

/// Writes `PRAGMA user_version` inside the current transaction and confirms
/// the store kept the exact value.
fn set_stored_version(connection: &Connection, version: u32) -> Result<(), ReconcileError> {
    connection.pragma_update(None, "user_version", version).map_err(db_error)?;
    let recorded = stored_version(connection)?;
    if recorded != version {
        return Err(ReconcileError::VersionMismatch(format!(
            "store recorded version {recorded} instead of {version}"
        )));
    }
    Ok(())
}
