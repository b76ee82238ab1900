//! Per-position delivery status for streams of known length.

use serde::Serialize;
use std::fmt;

/// Whether a position has been accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Committed, or received and waiting in the holding area.
    Satisfied,
    Missing,
}

/// Status of positions `[0, min(expected + lookahead, total))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub slots: Vec<SlotStatus>,
}

impl StatusReport {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Status of `seq`, or `None` if the report does not cover it.
    pub fn get(&self, seq: u64) -> Option<SlotStatus> {
        usize::try_from(seq).ok().and_then(|i| self.slots.get(i).copied())
    }

    /// Sequence numbers reported missing, ascending.
    pub fn missing(&self) -> Vec<u64> {
        self.positions(SlotStatus::Missing)
    }

    /// Sequence numbers reported satisfied, ascending.
    pub fn satisfied(&self) -> Vec<u64> {
        self.positions(SlotStatus::Satisfied)
    }

    fn positions(&self, want: SlotStatus) -> Vec<u64> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == want)
            .map(|(i, _)| i as u64)
            .collect()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let mark = match slot {
                SlotStatus::Satisfied => '✓',
                SlotStatus::Missing => '✗',
            };
            write!(f, "{i}{mark}")?;
        }
        Ok(())
    }
}
