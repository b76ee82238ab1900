//! # reseq-core
//!
//! In-order reassembly of an unreliable, out-of-order packet stream.
//!
//! Packets arrive in any order, possibly duplicated. The [`ReassemblyBuffer`]
//! holds early arrivals, drops duplicates, and commits every contiguous run
//! starting at the expected sequence to the reconstructed message. It is pure
//! logic: no sockets, no timers, no printing.
//!
//! ## Crate structure
//!
//! - [`packet`] — The `Packet` value type
//! - [`buffer`] — Reassembly state machine, outcomes and events
//! - [`status`] — Satisfied/missing view for known-length streams
//! - [`arq`] — Gap ranges and simulated retransmission timeouts
//! - [`config`] — Buffer configuration
//! - [`stats`] — Counters and summary snapshot
//! - [`error`] — Input rejection errors

pub mod arq;
pub mod buffer;
pub mod config;
pub mod error;
pub mod packet;
pub mod stats;
pub mod status;

pub use buffer::{DeliveredSegment, ReassemblyBuffer, ReassemblyEvent, ReceiveOutcome};
pub use config::ReassemblyConfig;
pub use error::ReassemblyError;
pub use packet::Packet;
