//! Buffer configuration.
//!
//! [`ReassemblyConfigInput`] is the loosely typed form read from scenario
//! files; [`ReassemblyConfigInput::resolve`] turns it into a validated
//! [`ReassemblyConfig`].

use serde::Deserialize;

/// Default number of positions past `expected` covered by a status report.
pub const DEFAULT_STATUS_LOOKAHEAD: u64 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReassemblyConfigInput {
    /// Stream length if known. Zero or negative means unknown.
    pub total_packets: Option<i64>,
    pub status_lookahead: Option<u64>,
    /// Absent or zero leaves the holding area unbounded.
    pub reorder_window: Option<u64>,
}

/// Reassembly buffer parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Total number of packets in the stream, when the host knows it.
    /// Enables range checks and status reports.
    pub total_packets: Option<u64>,
    /// Positions past `expected` included in each status report.
    pub status_lookahead: u64,
    /// Maximum distance past `expected` a held packet may sit.
    /// `None` (the default) holds any out-of-order packet, however far ahead.
    pub reorder_window: Option<u64>,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        ReassemblyConfig {
            total_packets: None,
            status_lookahead: DEFAULT_STATUS_LOOKAHEAD,
            reorder_window: None,
        }
    }
}

impl ReassemblyConfig {
    /// Config for a stream whose length may be known. Negative or zero
    /// totals mean an unknown-length stream.
    pub fn with_total(total: Option<i64>) -> Self {
        ReassemblyConfig {
            total_packets: known_total(total),
            ..Default::default()
        }
    }

    /// Refuse arrivals `window` or more sequences past `expected`.
    /// A zero window disables the limit.
    pub fn with_reorder_window(mut self, window: u64) -> Self {
        self.reorder_window = Some(window).filter(|&w| w > 0);
        self
    }
}

impl ReassemblyConfigInput {
    pub fn resolve(self) -> ReassemblyConfig {
        ReassemblyConfig {
            total_packets: known_total(self.total_packets),
            status_lookahead: self
                .status_lookahead
                .unwrap_or(DEFAULT_STATUS_LOOKAHEAD),
            reorder_window: self.reorder_window.filter(|&w| w > 0),
        }
    }
}

fn known_total(total: Option<i64>) -> Option<u64> {
    total.and_then(|t| u64::try_from(t).ok()).filter(|&t| t > 0)
}
