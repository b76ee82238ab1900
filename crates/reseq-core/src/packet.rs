//! # Packet
//!
//! The unit of arrival: a sequence number and a payload token. Packets carry
//! no identity beyond their sequence number; two packets with the same
//! sequence are the same packet as far as reassembly is concerned.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{InvalidReason, ReassemblyError};

/// A single segment of a logical stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    sequence: u64,
    payload: String,
}

impl Packet {
    /// Build a packet from an already validated sequence number.
    pub fn new(sequence: u64, payload: impl Into<String>) -> Self {
        Packet {
            sequence,
            payload: payload.into(),
        }
    }

    /// Build a packet from a signed sequence number, as handed over by hosts
    /// that parse untrusted input. Negative values are rejected.
    pub fn try_new(sequence: i64, payload: impl Into<String>) -> Result<Self, ReassemblyError> {
        let sequence = u64::try_from(sequence).map_err(|_| ReassemblyError::InvalidSequenceNumber {
            sequence,
            reason: InvalidReason::Negative,
        })?;
        Ok(Packet::new(sequence, payload))
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consume the packet, keeping only its payload.
    pub fn into_payload(self) -> String {
        self.payload
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet[{}: {}]", self.sequence, self.payload)
    }
}
