// crates/reconcile-store-sqlite/src/lib.rs
// ============================================================================
// Module: Schema Reconcile SQLite Store
// Description: SQLite schema reconciliation engine and store lifecycle.
// Purpose: Recreate a declared schema across versions while keeping rows.
// Dependencies: reconcile-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! On a version change the [`Reconciler`] backs up every declared table that
//! exists, recreates the declared schema, and repopulates each table from its
//! backup through the columns both shapes share. A table whose repopulation
//! hits a store fault is left empty and reported; every other failure rolls the
//! whole transition back.
//! Invariants:
//! - A transition runs inside one `SQLite` transaction, including the
//!   `user_version` update.
//! - No backup table survives a committed transition.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backup;
pub mod controller;
pub mod probe;
pub mod repopulate;
pub mod rows;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use controller::ReconcileOptions;
pub use controller::Reconciler;
pub use controller::stored_version;
pub use probe::TablePresence;
pub use probe::probe_table;
pub use repopulate::Repopulator;
pub use rows::BackupRows;
pub use store::ReconcileError;
pub use store::SqliteSchemaStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::StoreStatus;
pub use store::TableStatus;
