#![no_main]

use libfuzzer_sys::fuzz_target;
use reseq_core::buffer::{ReassemblyBuffer, ReceiveOutcome};
use reseq_core::config::ReassemblyConfig;
use reseq_core::packet::Packet;

/// Fuzz the reassembly buffer with arbitrary arrival orders.
///
/// Each input byte is a sequence number. The buffer must never panic, the
/// cursor must never move backwards, and duplicates must never change the
/// summary.
fuzz_target!(|data: &[u8]| {
    let total = data.first().map(|&b| i64::from(b % 32) - 4);
    let mut buf = ReassemblyBuffer::new(ReassemblyConfig {
        reorder_window: Some(64),
        ..ReassemblyConfig::with_total(total)
    });

    let mut last = 0;
    for &byte in data.iter().skip(1) {
        let seq = u64::from(byte);
        let before = buf.summary();
        if let Ok(ReceiveOutcome::Duplicate) = buf.receive(Packet::new(seq, "x")) {
            assert_eq!(buf.summary(), before);
        }
        assert!(buf.expected() >= last);
        last = buf.expected();
        let _ = buf.simulate_timeout();
    }

    for _ in buf.drain_events() {}
});
