// crates/reconcile-store-sqlite/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for reconcile-store-sqlite tests.
// Purpose: Build declarations, seed stores, and record transition events.
// Dependencies: reconcile-core, reconcile-store-sqlite, rusqlite
// ============================================================================

//! ## Overview
//! Provides declaration builders, a recording observer, and small query
//! helpers shared by the transition, fault, and lifecycle tests.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]
#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::sync::Arc;
use std::sync::Mutex;

use reconcile_core::BatchSize;
use reconcile_core::SchemaDeclaration;
use reconcile_core::SchemaVersion;
use reconcile_core::TableSpec;
use reconcile_core::TransitionEvent;
use reconcile_core::TransitionObserver;
use reconcile_store_sqlite::ReconcileOptions;
use reconcile_store_sqlite::Reconciler;
use rusqlite::Connection;
use rusqlite::types::Value;

// ============================================================================
// SECTION: Declarations
// ============================================================================

pub fn declaration(version: u32, tables: &[(&str, &str)], removed: &[&str]) -> SchemaDeclaration {
    SchemaDeclaration::new(
        SchemaVersion::new(version).expect("nonzero version"),
        tables.iter().map(|(name, create)| TableSpec::new(*name, *create)).collect(),
        removed.iter().map(ToString::to_string).collect(),
    )
    .expect("valid declaration")
}

pub fn reconciler(declaration: SchemaDeclaration, batch_rows: usize) -> Reconciler {
    let options = ReconcileOptions {
        batch_size: BatchSize::new(batch_rows),
        ..ReconcileOptions::default()
    };
    Reconciler::new(declaration, options).expect("reconciler")
}

pub fn observed_reconciler(
    declaration: SchemaDeclaration,
    batch_rows: usize,
) -> (Reconciler, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let reconciler = reconciler(declaration, batch_rows).with_observer(observer.clone());
    (reconciler, observer)
}

/// Creates `tables` at `version` on a fresh in-memory store, then runs `seed`.
pub fn seeded_store(version: u32, tables: &[(&str, &str)], seed: &str) -> Connection {
    let mut connection = Connection::open_in_memory().expect("open in-memory store");
    reconciler(declaration(version, tables, &[]), 500)
        .on_create(&mut connection)
        .expect("create schema");
    connection.execute_batch(seed).expect("seed rows");
    connection
}

// ============================================================================
// SECTION: Observer
// ============================================================================

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TransitionEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().expect("observer lock").clone()
    }

    pub fn degraded_tables(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TransitionEvent::Degraded {
                    table, ..
                } => Some(table),
                _ => None,
            })
            .collect()
    }
}

impl TransitionObserver for RecordingObserver {
    fn record(&self, event: &TransitionEvent) {
        self.events.lock().expect("observer lock").push(event.clone());
    }
}

// ============================================================================
// SECTION: Queries
// ============================================================================

pub fn rows(connection: &Connection, sql: &str) -> Vec<Vec<Value>> {
    let mut statement = connection.prepare(sql).expect("prepare query");
    let width = statement.column_count();
    statement
        .query_map([], |row| (0 .. width).map(|index| row.get::<_, Value>(index)).collect())
        .expect("run query")
        .collect::<Result<_, _>>()
        .expect("read rows")
}

pub fn count(connection: &Connection, table: &str) -> i64 {
    connection
        .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
        .expect("count rows")
}

pub fn user_version(connection: &Connection) -> i64 {
    connection.pragma_query_value(None, "user_version", |row| row.get(0)).expect("user_version")
}

pub fn table_names(connection: &Connection) -> Vec<String> {
    let mut statement = connection
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .expect("prepare catalog query");
    statement
        .query_map([], |row| row.get(0))
        .expect("run catalog query")
        .collect::<Result<_, _>>()
        .expect("read catalog")
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
