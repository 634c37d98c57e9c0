// crates/reconcile-store-sqlite/tests/store_lifecycle.rs
// ============================================================================
// Module: SQLite Schema Store Lifecycle Tests
// Description: Open, reopen, inspect, and close file-backed stores.
// Purpose: Validate version dispatch and path safety on real database files.
// ============================================================================

//! ## Overview
//! File-backed tests for [`SqliteSchemaStore`]:
//! - Fresh files run creation; matching versions run nothing
//! - Higher and lower declared versions dispatch upgrade and downgrade
//! - Creation is idempotent on an existing schema
//! - Inspection never writes
//! - Path limits and directories are rejected

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::path::Path;
use std::path::PathBuf;

use reconcile_core::TransitionKind;
use reconcile_store_sqlite::ReconcileError;
use reconcile_store_sqlite::SqliteSchemaStore;
use reconcile_store_sqlite::SqliteStoreConfig;
use reconcile_store_sqlite::SqliteStoreMode;
use reconcile_store_sqlite::TableStatus;
use rusqlite::Connection;
use tempfile::TempDir;

use crate::common::count;
use crate::common::declaration;
use crate::common::reconciler;
use crate::common::user_version;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const ITEM_V1: &str = "CREATE TABLE IF NOT EXISTS Item (id INTEGER, name TEXT)";
const ITEM_V2: &str = "CREATE TABLE IF NOT EXISTS Item (id INTEGER, name TEXT, price REAL)";

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("store.sqlite")
}

fn open_at(path: &Path, version: u32, create: &str) -> SqliteSchemaStore {
    SqliteSchemaStore::open(
        SqliteStoreConfig::for_path(path),
        &reconciler(declaration(version, &[("Item", create)], &[]), 500),
    )
    .expect("open store")
}

// ============================================================================
// SECTION: Version Dispatch
// ============================================================================

#[test]
fn fresh_file_runs_creation() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_at(&store_path(&dir), 1, ITEM_V1);

    let report = store.last_transition().expect("creation report");
    assert_eq!(report.kind, TransitionKind::Create);
    assert_eq!(report.from_version, 0);
    assert!(report.tables.is_empty());
    assert_eq!(store.schema_version().expect("version"), 1);
    store.close().expect("close");
}

#[test]
fn matching_version_runs_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let path = store_path(&dir);
    open_at(&path, 1, ITEM_V1).close().expect("close");

    let store = open_at(&path, 1, ITEM_V1);
    assert!(store.last_transition().is_none());
    store.close().expect("close");
}

#[test]
fn reopen_dispatches_upgrade_then_downgrade() {
    let dir = TempDir::new().expect("tempdir");
    let path = store_path(&dir);
    let store = open_at(&path, 1, ITEM_V1);
    store.connection().execute_batch("INSERT INTO Item VALUES (1, 'a');").expect("seed");
    store.close().expect("close");

    let upgraded = open_at(&path, 2, ITEM_V2);
    assert_eq!(upgraded.last_transition().map(|report| report.kind), Some(TransitionKind::Upgrade));
    assert_eq!(count(upgraded.connection(), "Item"), 1);
    upgraded.close().expect("close");

    let downgraded = open_at(&path, 1, ITEM_V1);
    let report = downgraded.last_transition().expect("downgrade report");
    assert_eq!(report.kind, TransitionKind::Downgrade);
    assert_eq!(report.from_version, 2);
    assert_eq!(count(downgraded.connection(), "Item"), 1);
    assert_eq!(user_version(downgraded.connection()), 1);
    downgraded.close().expect("close");
}

#[test]
fn creation_is_idempotent_on_existing_schema() {
    let mut connection = Connection::open_in_memory().expect("open in-memory store");
    let reconciler = reconciler(declaration(1, &[("Item", ITEM_V1)], &[]), 500);
    reconciler.on_create(&mut connection).expect("first create");
    connection.execute_batch("INSERT INTO Item VALUES (1, 'a');").expect("seed");

    reconciler.on_create(&mut connection).expect("second create");
    assert_eq!(count(&connection, "Item"), 1);
    assert_eq!(user_version(&connection), 1);
}

#[test]
fn parent_directories_are_created() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("deeper").join("store.sqlite");
    let mut config = SqliteStoreConfig::for_path(&path);
    config.journal_mode = SqliteStoreMode::Delete;
    let store = SqliteSchemaStore::open(
        config,
        &reconciler(declaration(1, &[("Item", ITEM_V1)], &[]), 500),
    )
    .expect("open nested store");
    assert_eq!(store.config().path, path);
    store.close().expect("close");
    assert!(path.exists());
}

// ============================================================================
// SECTION: Inspection
// ============================================================================

#[test]
fn inspect_missing_file_reports_absent_tables() {
    let dir = TempDir::new().expect("tempdir");
    let path = store_path(&dir);
    let status = SqliteSchemaStore::inspect(
        &SqliteStoreConfig::for_path(&path),
        &declaration(2, &[("Item", ITEM_V2)], &[]),
    )
    .expect("inspect");

    assert_eq!(status.stored_version, 0);
    assert_eq!(status.declared_version, 2);
    assert_eq!(
        status.tables,
        vec![TableStatus {
            table: "Item".to_string(),
            present: false,
            rows: None,
        }]
    );
    assert!(!path.exists());
}

#[test]
fn inspect_reports_rows_without_reconciling() {
    let dir = TempDir::new().expect("tempdir");
    let path = store_path(&dir);
    let store = open_at(&path, 1, ITEM_V1);
    store.connection().execute_batch("INSERT INTO Item VALUES (1, 'a'), (2, 'b');").expect("seed");
    store.close().expect("close");

    let status = SqliteSchemaStore::inspect(
        &SqliteStoreConfig::for_path(&path),
        &declaration(
            2,
            &[("Item", ITEM_V2), ("Tag", "CREATE TABLE IF NOT EXISTS Tag (label TEXT)")],
            &[],
        ),
    )
    .expect("inspect");

    assert_eq!(status.stored_version, 1);
    assert_eq!(status.tables[0].rows, Some(2));
    assert!(!status.tables[1].present);
    let connection = Connection::open(&path).expect("reopen");
    assert_eq!(user_version(&connection), 1);
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let result = SqliteSchemaStore::open(
        SqliteStoreConfig::for_path(dir.path()),
        &reconciler(declaration(1, &[("Item", ITEM_V1)], &[]), 500),
    );
    assert!(matches!(result, Err(ReconcileError::Invalid(_))));
}

#[test]
fn overlong_component_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("a".repeat(300));
    let result = SqliteSchemaStore::open(
        SqliteStoreConfig::for_path(path),
        &reconciler(declaration(1, &[("Item", ITEM_V1)], &[]), 500),
    );
    assert!(matches!(result, Err(ReconcileError::Invalid(_))));
}

#[test]
fn empty_path_is_rejected() {
    let result = SqliteSchemaStore::inspect(
        &SqliteStoreConfig::for_path(""),
        &declaration(1, &[("Item", ITEM_V1)], &[]),
    );
    assert!(matches!(result, Err(ReconcileError::Invalid(_))));
}
