// crates/reconcile-core/src/lib.rs
// ============================================================================
// Module: Schema Reconcile Core
// Description: Store-agnostic model for schema version transitions.
// Purpose: Provide declarations, column mapping, and statement building.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This crate holds the parts of schema reconciliation that do not touch a
//! database connection: the declared schema, row shapes and their column
//! intersection, the parameterized statement builder, the batch size policy,
//! and the per-table reports emitted by a transition.
//! Invariants:
//! - A [`SchemaDeclaration`] is validated on construction and immutable after.
//! - An [`InsertStatement`] always has as many placeholders as columns.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod batch;
pub mod columns;
pub mod observer;
pub mod report;
pub mod schema;
pub mod statement;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use batch::BatchSize;
pub use batch::BatchSizePolicy;
pub use batch::DEFAULT_BASELINE_ROWS;
pub use columns::ColumnIntersection;
pub use columns::RowShape;
pub use observer::NoopObserver;
pub use observer::TransitionEvent;
pub use observer::TransitionObserver;
pub use report::TableReport;
pub use report::TransitionKind;
pub use report::TransitionOutcome;
pub use report::TransitionReport;
pub use schema::DEFAULT_BACKUP_SUFFIX;
pub use schema::MAX_SCHEMA_VERSION;
pub use schema::SchemaDeclaration;
pub use schema::SchemaError;
pub use schema::SchemaVersion;
pub use schema::TableSpec;
pub use statement::InsertStatement;
pub use statement::StatementError;
pub use statement::quote_identifier;
