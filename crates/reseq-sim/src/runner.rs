//! Scenario runner.
//!
//! Feeds a [`Scenario`] into a fresh [`ReassemblyBuffer`], renders the
//! buffer's events as `tracing` records, and collects a serializable report.

use serde::Serialize;
use tracing::{debug, info, warn};

use reseq_core::arq::TimeoutNotice;
use reseq_core::buffer::{ReassemblyBuffer, ReassemblyEvent, ReceiveOutcome};
use reseq_core::packet::Packet;
use reseq_core::stats::{ReassemblyStats, Summary};

use crate::scenario::{Scenario, Step};

/// Per-outcome tallies for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub committed: u64,
    pub buffered: u64,
    pub duplicate: u64,
    pub rejected: u64,
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcomes: OutcomeCounts,
    pub timeouts: Vec<TimeoutNotice>,
    pub summary: Summary,
    pub stats: ReassemblyStats,
    /// `Some` only for streams of known length.
    pub complete: Option<bool>,
}

/// Run `scenario` to completion.
pub fn run_scenario(scenario: &Scenario) -> ScenarioReport {
    let span = tracing::info_span!("scenario", name = %scenario.name);
    let _guard = span.enter();

    info!(
        description = %scenario.description,
        total_packets = ?scenario.buffer.total_packets,
        arrivals = scenario.arrivals(),
        "starting scenario"
    );

    let mut buf = ReassemblyBuffer::new(scenario.buffer.clone());
    let mut outcomes = OutcomeCounts::default();
    let mut timeouts = Vec::new();

    for step in &scenario.steps {
        match step {
            Step::Deliver { sequence, payload } => {
                info!(seq = *sequence, %payload, "receiving packet");
                let result =
                    Packet::try_new(*sequence, payload.as_str()).and_then(|pkt| buf.receive(pkt));
                match result {
                    Ok(ReceiveOutcome::Committed { .. }) => outcomes.committed += 1,
                    Ok(ReceiveOutcome::Buffered) => outcomes.buffered += 1,
                    Ok(ReceiveOutcome::Duplicate) => outcomes.duplicate += 1,
                    Err(err) => {
                        warn!(error = %err, "packet rejected");
                        outcomes.rejected += 1;
                    }
                }
                render_events(&mut buf);
            }
            Step::Timeout => {
                let notice = buf.simulate_timeout();
                warn!(
                    missing = notice.missing,
                    retransmit = notice.retransmit,
                    gaps = ?notice.gaps,
                    "timeout: requesting retransmission"
                );
                timeouts.push(notice);
            }
        }
    }

    let summary = buf.summary();
    info!(
        message = %summary.message,
        next_expected = summary.expected,
        pending = summary.pending,
        delivered = summary.delivered,
        "final summary"
    );

    ScenarioReport {
        name: scenario.name.clone(),
        outcomes,
        timeouts,
        summary,
        stats: buf.stats().clone(),
        complete: buf.total_packets().map(|_| buf.is_complete()),
    }
}

fn render_events(buf: &mut ReassemblyBuffer) {
    let held: Vec<u64> = buf.pending_sequences().collect();
    let expected = buf.expected();
    let message = buf.message();

    for event in buf.drain_events() {
        match event {
            ReassemblyEvent::Deliver(seg) => {
                info!(seq = seg.sequence, payload = %seg.payload, "processed packet");
            }
            ReassemblyEvent::Buffered { sequence, pending } => {
                debug!(seq = sequence, pending, buffer = ?held, "holding out-of-order packet");
            }
            ReassemblyEvent::Duplicate { sequence } => {
                info!(seq = sequence, "ignoring duplicate packet");
            }
            ReassemblyEvent::Rejected(err) => {
                debug!(error = %err, "rejection recorded");
            }
            ReassemblyEvent::Status(report) => {
                info!(status = %report, "packet status");
            }
        }
    }

    debug!(next_expected = expected, %message, buffer = ?held, "buffer state");
}
