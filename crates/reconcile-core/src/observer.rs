// crates/reconcile-core/src/observer.rs
// ============================================================================
// Module: Transition Observer
// Description: Telemetry hook for schema transitions.
// Purpose: Surface backups, copies, and degraded tables without hard deps.
// Dependencies: crate::report
// ============================================================================

//! ## Overview
//! A thin event interface so embedding applications can count degraded tables
//! or forward them to their own telemetry. Events carry table names and store
//! messages only, never row values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::report::TransitionKind;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Transition event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    /// A transition started.
    Started {
        /// Transition direction.
        kind: TransitionKind,
        /// Stored version.
        from_version: u32,
        /// Declared version.
        to_version: u32,
    },
    /// A table was copied into its backup and dropped.
    BackedUp {
        /// Table name.
        table: String,
    },
    /// A table was repopulated from its backup.
    Repopulated {
        /// Table name.
        table: String,
        /// Rows carried forward.
        rows: u64,
    },
    /// A table degraded to empty after a store fault.
    Degraded {
        /// Table name.
        table: String,
        /// Store fault message.
        message: String,
    },
    /// The transition committed.
    Committed {
        /// Declared version now stored.
        to_version: u32,
    },
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for transition events.
pub trait TransitionObserver: Send + Sync {
    /// Records a transition event.
    fn record(&self, event: &TransitionEvent);
}

/// No-op observer.
///
/// # Invariants
/// - Events are intentionally discarded.
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn record(&self, _event: &TransitionEvent) {}
}
