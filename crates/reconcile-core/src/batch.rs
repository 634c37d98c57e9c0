// crates/reconcile-core/src/batch.rs
// ============================================================================
// Module: Batch Size Policy
// Description: Rows per repopulation batch derived from a memory ceiling.
// Purpose: Bound per-batch journal growth on memory-constrained hosts.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The batch size is resolved once, when the reconciler is configured, and
//! handed to the repopulation executor as a plain value. Tiers:
//! - memory ceiling at or below 16 MiB: baseline / 8
//! - memory ceiling at or below 24 MiB: baseline / 4
//! - larger or unknown ceiling: baseline
//!
//! The result is never below one row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroUsize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum rows per batch.
pub const DEFAULT_BASELINE_ROWS: usize = 500;
/// Memory ceiling (MiB) at or below which the smallest tier applies.
pub const LOW_MEMORY_CEILING_MB: u64 = 16;
/// Memory ceiling (MiB) at or below which the middle tier applies.
pub const MID_MEMORY_CEILING_MB: u64 = 24;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Maximum rows inserted per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    /// Creates a batch size, clamping zero to one.
    #[must_use]
    pub const fn new(rows: usize) -> Self {
        match NonZeroUsize::new(rows) {
            Some(value) => Self(value),
            None => Self(NonZeroUsize::MIN),
        }
    }

    /// Returns the row count.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_ROWS)
    }
}

/// Policy mapping a memory ceiling to a batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSizePolicy {
    /// Rows per batch when memory is not constrained.
    pub baseline_rows: usize,
    /// Apply the low-memory tiers; when false the baseline is always used.
    pub tiered: bool,
}

impl Default for BatchSizePolicy {
    fn default() -> Self {
        Self {
            baseline_rows: DEFAULT_BASELINE_ROWS,
            tiered: true,
        }
    }
}

impl BatchSizePolicy {
    /// Resolves the batch size for an optional memory ceiling in MiB.
    #[must_use]
    pub const fn resolve(&self, memory_ceiling_mb: Option<u64>) -> BatchSize {
        let rows = match memory_ceiling_mb {
            Some(ceiling) if self.tiered && ceiling <= LOW_MEMORY_CEILING_MB => {
                self.baseline_rows / 8
            }
            Some(ceiling) if self.tiered && ceiling <= MID_MEMORY_CEILING_MB => {
                self.baseline_rows / 4
            }
            _ => self.baseline_rows,
        };
        BatchSize::new(rows)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
