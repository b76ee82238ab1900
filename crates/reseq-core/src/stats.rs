//! # Reassembly Statistics
//!
//! Counters kept by the reassembly buffer, plus the read-only summary
//! snapshot. Both serialize to JSON for reporting.

use serde::Serialize;

// ─── Buffer Stats ───────────────────────────────────────────────────────────

/// Aggregate counters for one reassembly buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReassemblyStats {
    /// Total packets handed to `receive` (including duplicates and rejects).
    pub packets_received: u64,
    /// Packets committed to the message.
    pub packets_delivered: u64,
    /// Packets discarded because their sequence was already delivered or pending.
    pub duplicates: u64,
    /// Packets refused as invalid input.
    pub rejected: u64,
    /// Packets that had to wait in the holding area for a predecessor.
    pub buffered_out_of_order: u64,
    /// Largest number of packets held at once.
    pub max_pending_depth: u64,
}

impl ReassemblyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of arrivals that were duplicates.
    pub fn duplicate_ratio(&self) -> f64 {
        if self.packets_received == 0 {
            0.0
        } else {
            self.duplicates as f64 / self.packets_received as f64
        }
    }

    pub(crate) fn observe_pending_depth(&mut self, depth: usize) {
        self.max_pending_depth = self.max_pending_depth.max(depth as u64);
    }
}

// ─── Summary ────────────────────────────────────────────────────────────────

/// Point-in-time snapshot of a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Reconstructed message so far.
    pub message: String,
    /// Next sequence number required to extend the message.
    pub expected: u64,
    /// Packets held out of order.
    pub pending: usize,
    /// Packets committed to the message.
    pub delivered: usize,
}
