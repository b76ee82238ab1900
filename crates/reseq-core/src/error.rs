//! Errors raised by the reassembly core.
//!
//! Only malformed input is an error. Duplicates and gaps are ordinary
//! outcomes and are reported through [`crate::buffer::ReceiveOutcome`].

use serde::Serialize;
use thiserror::Error;

/// Why a sequence number was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Sequence numbers start at zero.
    Negative,
    /// The stream length is known and the sequence lies past its end.
    OutOfRange { total: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ReassemblyError {
    #[error("invalid sequence number {sequence}: {reason}")]
    InvalidSequenceNumber { sequence: i64, reason: InvalidReason },

    #[error(
        "sequence {sequence} is beyond the reorder window \
         (expected {expected}, window {window})"
    )]
    ReorderWindowExceeded {
        sequence: u64,
        expected: u64,
        window: u64,
    },
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::Negative => f.write_str("negative"),
            InvalidReason::OutOfRange { total } => {
                write!(f, "out of range for a stream of {total} packets")
            }
        }
    }
}

impl ReassemblyError {
    /// Out-of-range rejection for a stream of known length.
    pub(crate) fn out_of_range(sequence: u64, total: u64) -> Self {
        ReassemblyError::InvalidSequenceNumber {
            sequence: i64::try_from(sequence).unwrap_or(i64::MAX),
            reason: InvalidReason::OutOfRange { total },
        }
    }
}
