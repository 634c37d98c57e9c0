// crates/reconcile-config/src/lib.rs
// ============================================================================
// Module: Schema Reconcile Config Library
// Description: Configuration model and validation for reconcile.toml.
// Purpose: Single source of truth for store, schema, and batch settings.
// Dependencies: reconcile-core, reconcile-store-sqlite, serde, sysinfo, toml
// ============================================================================

//! ## Overview
//! `reconcile-config` loads the declared schema and store settings from TOML,
//! validates them fail-closed, and resolves them into the values the engine
//! consumes: a [`SchemaDeclaration`](reconcile_core::SchemaDeclaration), a
//! [`SqliteStoreConfig`](reconcile_store_sqlite::SqliteStoreConfig), and
//! [`ReconcileOptions`](reconcile_store_sqlite::ReconcileOptions).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod memory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use memory::detect_memory_ceiling_mb;
