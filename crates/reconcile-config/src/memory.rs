// crates/reconcile-config/src/memory.rs
// ============================================================================
// Module: Host Memory Ceiling
// Description: Detects the memory available to this process.
// Purpose: Feed batch tiering when no explicit ceiling is configured.
// Dependencies: sysinfo
// ============================================================================

//! ## Overview
//! The ceiling is the cgroup memory limit when the process runs under one,
//! otherwise total physical memory. It is read once while configuration is
//! loaded; an unreadable or zero value yields `None` and the baseline batch
//! size applies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sysinfo::System;

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Bytes per MiB.
const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Returns the memory ceiling for this process in MiB, when detectable.
#[must_use]
pub fn detect_memory_ceiling_mb() -> Option<u64> {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();
    let bytes = match system.cgroup_limits() {
        Some(limits) if limits.total_memory > 0 && (total == 0 || limits.total_memory < total) => {
            limits.total_memory
        }
        _ => total,
    };
    ceiling_from_bytes(bytes)
}

/// Converts a byte count to whole MiB, rejecting zero.
fn ceiling_from_bytes(bytes: u64) -> Option<u64> {
    match bytes / BYTES_PER_MIB {
        0 => None,
        mb => Some(mb),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
