//! # Reassembly Buffer
//!
//! Pure logic — no I/O. Accepts packets in any arrival order, drops
//! duplicates, holds out-of-order packets until their predecessors arrive,
//! and commits every contiguous run starting at the expected sequence to the
//! reconstructed message.
//!
//! ## Per-arrival pipeline
//!
//! 1. **Validation**: refuse sequences past the stream end or the reorder window
//! 2. **Duplicate check**: against both committed and held sequences
//! 3. **Sorted insertion**: into the holding area, keyed by sequence
//! 4. **Drain**: commit while the lowest held sequence equals `expected`
//! 5. **Status report**: satisfied/missing view around the cursor
//!
//! A sequence has been received iff it is below `expected` or held. Presence
//! is read off those two rather than stored per slot, so a huge stream length
//! costs nothing up front.
//!
//! Nothing is printed. Each call returns a [`ReceiveOutcome`] and queues
//! [`ReassemblyEvent`]s for the host to render or act upon.

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use tracing::{debug, trace};

use crate::arq::{missing_ranges, TimeoutNotice};
use crate::config::ReassemblyConfig;
use crate::error::ReassemblyError;
use crate::packet::Packet;
use crate::stats::{ReassemblyStats, Summary};
use crate::status::{SlotStatus, StatusReport};

// ─── Outcomes & Events ──────────────────────────────────────────────────────

/// What a single `receive` call did with its packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The packet extended the message, together with any held successors.
    Committed {
        /// Sequences committed by this call.
        sequences: Range<u64>,
    },
    /// The packet arrived ahead of `expected` and is being held.
    Buffered,
    /// The sequence was already committed or held; the packet was discarded.
    Duplicate,
}

impl ReceiveOutcome {
    /// Number of packets committed by this call.
    pub fn committed(&self) -> u64 {
        match self {
            ReceiveOutcome::Committed { sequences } => sequences.end - sequences.start,
            _ => 0,
        }
    }
}

/// A payload committed to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredSegment {
    pub sequence: u64,
    pub payload: String,
}

/// Events the buffer generates for its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyEvent {
    /// A packet was committed to the message.
    Deliver(DeliveredSegment),
    /// A packet is held out of order; `pending` is the holding area size after insertion.
    Buffered { sequence: u64, pending: usize },
    /// A packet was discarded as a duplicate.
    Duplicate { sequence: u64 },
    /// A packet was refused.
    Rejected(ReassemblyError),
    /// Delivery status after an arrival (known-length streams only).
    Status(StatusReport),
}

// ─── Reassembly Buffer ──────────────────────────────────────────────────────

/// In-order reassembly state for one logical stream.
#[derive(Debug)]
pub struct ReassemblyBuffer {
    config: ReassemblyConfig,
    /// Held packets, ascending by sequence. Never contains a committed sequence.
    pending: BTreeMap<u64, Packet>,
    /// Next sequence needed to extend the message.
    expected: u64,
    message: Vec<String>,
    delivered: HashSet<u64>,
    stats: ReassemblyStats,
    events: Vec<ReassemblyEvent>,
}

impl ReassemblyBuffer {
    /// Create a new buffer with the given configuration.
    pub fn new(config: ReassemblyConfig) -> Self {
        ReassemblyBuffer {
            config,
            pending: BTreeMap::new(),
            expected: 0,
            message: Vec::new(),
            delivered: HashSet::new(),
            stats: ReassemblyStats::default(),
            events: Vec::new(),
        }
    }

    /// Buffer for a stream of `total` packets; `None` or a non-positive
    /// total means the length is unknown.
    pub fn with_total(total: Option<i64>) -> Self {
        Self::new(ReassemblyConfig::with_total(total))
    }

    /// Accept one packet.
    ///
    /// Invalid sequences are refused before any state changes. Duplicates
    /// are not errors; they come back as [`ReceiveOutcome::Duplicate`].
    pub fn receive(&mut self, packet: Packet) -> Result<ReceiveOutcome, ReassemblyError> {
        let seq = packet.sequence();
        self.stats.packets_received += 1;

        if let Err(err) = self.validate(seq) {
            self.stats.rejected += 1;
            debug!(seq, error = %err, "rejected packet");
            self.events.push(ReassemblyEvent::Rejected(err.clone()));
            return Err(err);
        }

        if self.delivered.contains(&seq) || self.pending.contains_key(&seq) {
            self.stats.duplicates += 1;
            debug!(seq, "duplicate packet ignored");
            self.events.push(ReassemblyEvent::Duplicate { sequence: seq });
            return Ok(ReceiveOutcome::Duplicate);
        }

        self.pending.insert(seq, packet);
        self.stats.observe_pending_depth(self.pending.len());

        let first = self.expected;
        self.drain_contiguous();

        let outcome = if self.expected > first {
            debug!(
                from = first,
                next_expected = self.expected,
                "committed contiguous run"
            );
            ReceiveOutcome::Committed {
                sequences: first..self.expected,
            }
        } else {
            self.stats.buffered_out_of_order += 1;
            trace!(seq, expected = self.expected, pending = self.pending.len(), "held out of order");
            self.events.push(ReassemblyEvent::Buffered {
                sequence: seq,
                pending: self.pending.len(),
            });
            ReceiveOutcome::Buffered
        };

        if let Some(report) = self.status() {
            self.events.push(ReassemblyEvent::Status(report));
        }

        Ok(outcome)
    }

    fn validate(&self, seq: u64) -> Result<(), ReassemblyError> {
        if let Some(total) = self.config.total_packets {
            if seq >= total {
                return Err(ReassemblyError::out_of_range(seq, total));
            }
        }
        if let Some(window) = self.config.reorder_window {
            if seq >= self.expected.saturating_add(window) {
                return Err(ReassemblyError::ReorderWindowExceeded {
                    sequence: seq,
                    expected: self.expected,
                    window,
                });
            }
        }
        Ok(())
    }

    /// Commit held packets while the lowest one is the expected sequence.
    fn drain_contiguous(&mut self) {
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.expected {
                break;
            }
            let packet = entry.remove();
            let sequence = packet.sequence();
            let payload = packet.into_payload();

            self.message.push(payload.clone());
            self.delivered.insert(sequence);
            self.expected += 1;
            self.stats.packets_delivered += 1;

            self.events
                .push(ReassemblyEvent::Deliver(DeliveredSegment { sequence, payload }));
        }
    }

    /// Satisfied/missing view of `[0, min(expected + lookahead, total))`.
    ///
    /// `None` when the stream length is unknown.
    pub fn status(&self) -> Option<StatusReport> {
        let total = self.config.total_packets?;
        let limit = self
            .expected
            .saturating_add(self.config.status_lookahead)
            .min(total);

        let slots = (0..limit)
            .map(|seq| {
                if self.is_received(seq) {
                    SlotStatus::Satisfied
                } else {
                    SlotStatus::Missing
                }
            })
            .collect();

        Some(StatusReport { slots })
    }

    /// Whether `seq` has arrived, committed or not.
    pub fn is_received(&self, seq: u64) -> bool {
        seq < self.expected || self.pending.contains_key(&seq)
    }

    /// Report the blocking sequence and request its retransmission.
    ///
    /// Does not change any state; wiring the notice to an actual request is
    /// up to the host.
    pub fn simulate_timeout(&self) -> TimeoutNotice {
        let ceiling = match self.config.total_packets {
            Some(total) => total,
            None => {
                let highest = self
                    .pending
                    .keys()
                    .next_back()
                    .map_or(0, |&s| s.saturating_add(1));
                highest.max(self.expected.saturating_add(1))
            }
        };

        TimeoutNotice {
            missing: self.expected,
            retransmit: self.expected,
            gaps: missing_ranges(self.expected, ceiling, self.pending.keys().copied()),
        }
    }

    /// The reconstructed message: committed payloads separated by single spaces.
    pub fn message(&self) -> String {
        self.message.join(" ").trim().to_string()
    }

    /// Read-only snapshot of the buffer.
    pub fn summary(&self) -> Summary {
        Summary {
            message: self.message(),
            expected: self.expected,
            pending: self.pending.len(),
            delivered: self.delivered.len(),
        }
    }

    /// Drain all buffer events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ReassemblyEvent> + '_ {
        self.events.drain(..)
    }

    /// Peek at the number of queued events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// The next sequence number expected for in-order delivery.
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Number of packets in the holding area.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Held sequence numbers, ascending.
    pub fn pending_sequences(&self) -> impl Iterator<Item = u64> + '_ {
        self.pending.keys().copied()
    }

    /// Number of packets committed to the message.
    pub fn delivered_len(&self) -> usize {
        self.delivered.len()
    }

    pub fn total_packets(&self) -> Option<u64> {
        self.config.total_packets
    }

    /// Whether every packet of a known-length stream has been committed.
    pub fn is_complete(&self) -> bool {
        self.config.total_packets == Some(self.expected)
    }

    pub fn stats(&self) -> &ReassemblyStats {
        &self.stats
    }

    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }
}

impl Default for ReassemblyBuffer {
    fn default() -> Self {
        Self::new(ReassemblyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arq::MissingRange;
    use crate::error::InvalidReason;

    fn pkt(seq: u64, payload: &str) -> Packet {
        Packet::new(seq, payload)
    }

    fn deliveries(buf: &mut ReassemblyBuffer) -> Vec<DeliveredSegment> {
        buf.drain_events()
            .filter_map(|e| match e {
                ReassemblyEvent::Deliver(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    // ─── Basic Receive & Delivery ───────────────────────────────────────

    #[test]
    fn in_order_packet_commits_immediately() {
        let mut buf = ReassemblyBuffer::default();
        let outcome = buf.receive(pkt(0, "Hello")).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Committed { sequences: 0..1 });
        assert_eq!(buf.message(), "Hello");
        assert_eq!(buf.expected(), 1);
        assert_eq!(buf.pending_len(), 0);

        let delivered = deliveries(&mut buf);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].sequence, 0);
        assert_eq!(delivered[0].payload, "Hello");
    }

    #[test]
    fn receive_updates_stats() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(1, "b")).unwrap();
        buf.receive(pkt(0, "a")).unwrap();
        buf.receive(pkt(0, "a")).unwrap();

        let stats = buf.stats();
        assert_eq!(stats.packets_received, 3);
        assert_eq!(stats.packets_delivered, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.buffered_out_of_order, 1);
        assert_eq!(stats.max_pending_depth, 2);
    }

    // ─── Reordering ─────────────────────────────────────────────────────

    #[test]
    fn out_of_order_held_until_gap_fills() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(0, "pkt0")).unwrap();
        buf.drain_events().for_each(drop);

        let outcome = buf.receive(pkt(2, "pkt2")).unwrap();
        assert_eq!(outcome, ReceiveOutcome::Buffered);
        assert!(deliveries(&mut buf).is_empty());
        assert_eq!(buf.pending_len(), 1);

        let outcome = buf.receive(pkt(1, "pkt1")).unwrap();
        assert_eq!(outcome, ReceiveOutcome::Committed { sequences: 1..3 });
        assert_eq!(outcome.committed(), 2);

        let delivered = deliveries(&mut buf);
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].sequence, 1);
        assert_eq!(delivered[1].sequence, 2);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn basic_scenario_two_zero_one() {
        let mut buf = ReassemblyBuffer::default();
        assert_eq!(buf.receive(pkt(2, "!")).unwrap(), ReceiveOutcome::Buffered);
        assert_eq!(
            buf.receive(pkt(0, "Hello")).unwrap(),
            ReceiveOutcome::Committed { sequences: 0..1 }
        );
        assert_eq!(
            buf.receive(pkt(1, "World")).unwrap(),
            ReceiveOutcome::Committed { sequences: 1..3 }
        );

        assert_eq!(buf.message(), "Hello World !");
        assert_eq!(buf.expected(), 3);
    }

    #[test]
    fn far_ahead_packet_is_only_held() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(5, "late")).unwrap();

        assert_eq!(buf.pending_len(), 1);
        assert_eq!(buf.message(), "");
        assert_eq!(buf.expected(), 0);
    }

    #[test]
    fn pending_sequences_are_sorted() {
        let mut buf = ReassemblyBuffer::default();
        for seq in [9, 3, 7, 1, 5] {
            buf.receive(pkt(seq, "x")).unwrap();
        }
        let held: Vec<_> = buf.pending_sequences().collect();
        assert_eq!(held, vec![1, 3, 5, 7, 9]);
    }

    // ─── Duplicate Detection ────────────────────────────────────────────

    #[test]
    fn duplicate_of_committed_packet() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(0, "Hello")).unwrap();
        let before = buf.summary();

        assert_eq!(
            buf.receive(pkt(0, "Hello")).unwrap(),
            ReceiveOutcome::Duplicate
        );
        assert_eq!(buf.summary(), before);
    }

    #[test]
    fn duplicate_of_held_packet_not_inserted_twice() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(2, "!")).unwrap();
        assert_eq!(buf.receive(pkt(2, "!")).unwrap(), ReceiveOutcome::Duplicate);
        assert_eq!(buf.pending_len(), 1);

        buf.receive(pkt(0, "Hello")).unwrap();
        buf.receive(pkt(1, "World")).unwrap();
        assert_eq!(buf.message(), "Hello World !");
        assert_eq!(buf.delivered_len(), 3);
    }

    #[test]
    fn held_duplicate_keeps_first_payload() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(1, "first")).unwrap();
        buf.receive(pkt(1, "second")).unwrap();
        buf.receive(pkt(0, "zero")).unwrap();
        assert_eq!(buf.message(), "zero first");
    }

    #[test]
    fn duplicate_emits_event() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(0, "a")).unwrap();
        buf.drain_events().for_each(drop);
        buf.receive(pkt(0, "a")).unwrap();

        let events: Vec<_> = buf.drain_events().collect();
        assert_eq!(events, vec![ReassemblyEvent::Duplicate { sequence: 0 }]);
    }

    // ─── Rejection ──────────────────────────────────────────────────────

    #[test]
    fn out_of_range_rejected_without_mutation() {
        let mut buf = ReassemblyBuffer::with_total(Some(3));
        buf.receive(pkt(1, "b")).unwrap();
        let before = buf.summary();

        let err = buf.receive(pkt(3, "c")).unwrap_err();
        assert_eq!(
            err,
            ReassemblyError::InvalidSequenceNumber {
                sequence: 3,
                reason: InvalidReason::OutOfRange { total: 3 },
            }
        );
        assert_eq!(buf.summary(), before);
        assert_eq!(buf.stats().rejected, 1);
        assert_eq!(buf.status().unwrap().get(2), Some(SlotStatus::Missing));
    }

    #[test]
    fn reorder_window_bounds_holding_area() {
        let mut buf = ReassemblyBuffer::new(ReassemblyConfig {
            reorder_window: Some(4),
            ..Default::default()
        });

        assert_eq!(buf.receive(pkt(3, "x")).unwrap(), ReceiveOutcome::Buffered);
        let err = buf.receive(pkt(4, "y")).unwrap_err();
        assert!(matches!(
            err,
            ReassemblyError::ReorderWindowExceeded {
                sequence: 4,
                expected: 0,
                window: 4
            }
        ));
        assert_eq!(buf.pending_len(), 1);

        // The window slides with the cursor.
        buf.receive(pkt(0, "a")).unwrap();
        assert_eq!(buf.receive(pkt(4, "y")).unwrap(), ReceiveOutcome::Buffered);
    }

    #[test]
    fn default_buffer_holds_anything() {
        let mut buf = ReassemblyBuffer::default();
        assert_eq!(
            buf.receive(pkt(1_000_000, "far")).unwrap(),
            ReceiveOutcome::Buffered
        );
    }

    #[test]
    fn known_length_accepts_every_in_range_sequence() {
        let mut buf = ReassemblyBuffer::with_total(Some(5000));
        assert_eq!(buf.receive(pkt(4999, "x")).unwrap(), ReceiveOutcome::Buffered);
        assert_eq!(buf.stats().rejected, 0);
    }

    #[test]
    fn huge_stream_length_allocates_nothing_up_front() {
        let mut buf = ReassemblyBuffer::with_total(Some(i64::MAX));
        assert_eq!(buf.total_packets(), Some(i64::MAX as u64));

        buf.receive(pkt(3, "d")).unwrap();
        buf.receive(pkt(0, "a")).unwrap();

        let report = buf.status().unwrap();
        assert_eq!(report.len(), 6);
        assert_eq!(report.satisfied(), vec![0, 3]);
        assert!(buf.is_received(3));
        assert!(!buf.is_received(1));
    }

    #[test]
    fn rejection_is_reported_as_event() {
        let mut buf = ReassemblyBuffer::with_total(Some(2));
        let _ = buf.receive(pkt(2, "x"));
        let events: Vec<_> = buf.drain_events().collect();
        assert!(matches!(events.as_slice(), [ReassemblyEvent::Rejected(_)]));
    }

    // ─── Status Reports ─────────────────────────────────────────────────

    #[test]
    fn status_with_known_total() {
        let mut buf = ReassemblyBuffer::with_total(Some(6));
        buf.receive(pkt(4, "last")).unwrap();
        buf.receive(pkt(0, "This")).unwrap();
        buf.receive(pkt(2, "test")).unwrap();

        assert_eq!(buf.expected(), 1);
        assert_eq!(buf.pending_sequences().collect::<Vec<_>>(), vec![2, 4]);

        let report = buf.status().unwrap();
        assert_eq!(report.len(), 6);
        assert_eq!(report.missing(), vec![1, 3, 5]);
        assert_eq!(report.satisfied(), vec![0, 2, 4]);
    }

    #[test]
    fn status_window_limited_by_lookahead() {
        let mut buf = ReassemblyBuffer::with_total(Some(20));
        buf.receive(pkt(0, "a")).unwrap();
        // expected = 1, lookahead 5 → positions 0..6
        assert_eq!(buf.status().unwrap().len(), 6);
    }

    #[test]
    fn no_status_without_total() {
        let mut buf = ReassemblyBuffer::with_total(Some(-1));
        buf.receive(pkt(1, "x")).unwrap();
        assert!(buf.status().is_none());
        assert!(buf
            .drain_events()
            .all(|e| !matches!(e, ReassemblyEvent::Status(_))));
    }

    #[test]
    fn status_event_follows_each_arrival() {
        let mut buf = ReassemblyBuffer::with_total(Some(3));
        buf.receive(pkt(1, "b")).unwrap();
        let events: Vec<_> = buf.drain_events().collect();
        assert!(matches!(events.last(), Some(ReassemblyEvent::Status(_))));
    }

    // ─── Timeout ────────────────────────────────────────────────────────

    #[test]
    fn timeout_reports_expected_and_gaps() {
        let mut buf = ReassemblyBuffer::with_total(Some(6));
        for (seq, word) in [(4, "last"), (0, "This"), (2, "test")] {
            buf.receive(pkt(seq, word)).unwrap();
        }
        let before = buf.summary();

        let notice = buf.simulate_timeout();
        assert_eq!(notice.missing, 1);
        assert_eq!(notice.retransmit, 1);
        assert_eq!(
            notice.gaps,
            vec![
                MissingRange { start: 1, count: 1 },
                MissingRange { start: 3, count: 1 },
                MissingRange { start: 5, count: 1 },
            ]
        );
        assert_eq!(buf.summary(), before);
    }

    #[test]
    fn timeout_on_unknown_length_stream() {
        let mut buf = ReassemblyBuffer::default();
        let notice = buf.simulate_timeout();
        assert_eq!(notice.missing, 0);
        assert_eq!(notice.gaps, vec![MissingRange { start: 0, count: 1 }]);

        buf.receive(pkt(3, "x")).unwrap();
        let notice = buf.simulate_timeout();
        assert_eq!(notice.gaps, vec![MissingRange { start: 0, count: 3 }]);
    }

    #[test]
    fn timeout_with_highest_possible_sequence_held() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(u64::MAX, "x")).unwrap();

        let notice = buf.simulate_timeout();
        assert_eq!(notice.missing, 0);
        assert_eq!(
            notice.gaps,
            vec![MissingRange {
                start: 0,
                count: u64::MAX
            }]
        );
        assert_eq!(notice.missing_count(), u64::MAX);
    }

    #[test]
    fn timeout_after_completion_has_no_gaps() {
        let mut buf = ReassemblyBuffer::with_total(Some(2));
        buf.receive(pkt(0, "a")).unwrap();
        buf.receive(pkt(1, "b")).unwrap();
        assert!(buf.is_complete());
        assert!(buf.simulate_timeout().gaps.is_empty());
    }

    // ─── Summary ────────────────────────────────────────────────────────

    #[test]
    fn summary_snapshot() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(0, "Hello")).unwrap();
        buf.receive(pkt(2, "!")).unwrap();

        let summary = buf.summary();
        assert_eq!(summary.message, "Hello");
        assert_eq!(summary.expected, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.delivered, 1);
    }

    #[test]
    fn message_is_idempotent() {
        let mut buf = ReassemblyBuffer::default();
        buf.receive(pkt(0, "a")).unwrap();
        assert_eq!(buf.message(), buf.message());
        assert_eq!(buf.pending_events(), 1);
    }
}
