//! # ARQ — gap tracking and retransmission requests
//!
//! The reassembly buffer never retransmits anything itself. When the host's
//! timer fires it asks the buffer for a [`TimeoutNotice`]: the sequence that
//! blocks delivery plus every hole behind the highest held packet, coalesced
//! into NACK-style ranges the host can forward to its peer.

use serde::Serialize;

// ─── Missing Range ──────────────────────────────────────────────────────────

/// A run of consecutive missing sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissingRange {
    /// First missing sequence.
    pub start: u64,
    /// Number of consecutive missing sequences (always >= 1).
    pub count: u64,
}

impl MissingRange {
    /// One past the last missing sequence, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.count)
    }

    pub fn contains(&self, seq: u64) -> bool {
        seq >= self.start && seq < self.end()
    }
}

/// Coalesce the holes in `[expected, ceiling)` not covered by `held`.
///
/// `held` must yield ascending sequence numbers, all `>= expected`.
pub fn missing_ranges<I>(expected: u64, ceiling: u64, held: I) -> Vec<MissingRange>
where
    I: IntoIterator<Item = u64>,
{
    let mut ranges = Vec::new();
    let mut cursor = expected;

    for seq in held {
        if seq >= ceiling {
            break;
        }
        if seq > cursor {
            ranges.push(MissingRange {
                start: cursor,
                count: seq - cursor,
            });
        }
        cursor = cursor.max(seq.saturating_add(1));
    }

    if ceiling > cursor {
        ranges.push(MissingRange {
            start: cursor,
            count: ceiling - cursor,
        });
    }
    ranges
}

// ─── Timeout Notice ─────────────────────────────────────────────────────────

/// Result of a simulated retransmission timeout.
///
/// Purely informational: building one does not touch buffer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeoutNotice {
    /// The sequence number delivery is blocked on.
    pub missing: u64,
    /// The sequence number whose retransmission is requested.
    pub retransmit: u64,
    /// Every known hole, starting at `missing`.
    pub gaps: Vec<MissingRange>,
}

impl TimeoutNotice {
    /// Total number of sequence numbers covered by `gaps`.
    pub fn missing_count(&self) -> u64 {
        self.gaps.iter().map(|r| r.count).sum()
    }
}
