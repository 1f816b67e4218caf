//! In-memory back-to-back transport pair, used by engine integration tests
//! and property tests in place of real serial hardware (spec Design Notes §9:
//! "a pseudo-terminal ... or an in-memory back-to-back pipe").

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::adapter::{ErrorCounters, TransportAdapter};

#[derive(Default)]
struct Shared {
    buf: Mutex<VecDeque<u8>>,
    notify: Notify,
}

impl Shared {
    fn push(&self, bytes: &[u8]) {
        self.buf.lock().unwrap().extend(bytes.iter().copied());
        self.notify.notify_waiters();
    }

    fn pop_into(&self, out: &mut [u8]) -> usize {
        let mut buf = self.buf.lock().unwrap();
        let n = out.len().min(buf.len());
        for slot in out.iter_mut().take(n) {
            *slot = buf.pop_front().unwrap();
        }
        n
    }

    fn len(&self) -> usize {
        self.buf.lock().unwrap().len()
    }
}

/// One side of an in-memory loopback pair.
pub struct LoopbackTransport {
    outbound: Arc<Shared>,
    inbound: Arc<Shared>,
    carrier_lost_latch: bool,
    cts_ok: bool,
    rts_asserted: bool,
    io_level: u32,
    errors: ErrorCounters,
    corrupt_next_write: bool,
}

impl LoopbackTransport {
    /// Builds a connected pair: bytes written to `a` appear readable on `b`
    /// and vice versa.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Shared::default());
        let b_to_a = Arc::new(Shared::default());
        let a = Self {
            outbound: Arc::clone(&a_to_b),
            inbound: Arc::clone(&b_to_a),
            carrier_lost_latch: false,
            cts_ok: true,
            rts_asserted: true,
            io_level: 0,
            errors: ErrorCounters::default(),
            corrupt_next_write: false,
        };
        let b = Self {
            outbound: b_to_a,
            inbound: a_to_b,
            carrier_lost_latch: false,
            cts_ok: true,
            rts_asserted: true,
            io_level: 0,
            errors: ErrorCounters::default(),
            corrupt_next_write: false,
        };
        (a, b)
    }

    /// Test hook: simulate carrier loss on this side.
    pub fn simulate_carrier_lost(&mut self) {
        self.carrier_lost_latch = true;
    }

    /// Test hook: simulate a line error tally (as if `ComReportErrors` ran).
    pub fn inject_framing_error(&mut self) {
        self.errors.framing += 1;
    }

    /// Test hook: flips one payload byte on the very next `write()` call,
    /// simulating a single corrupted byte landing on the wire.
    pub fn corrupt_next_write(&mut self) {
        self.corrupt_next_write = true;
    }
}

impl TransportAdapter for LoopbackTransport {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.corrupt_next_write && !bytes.is_empty() {
            self.corrupt_next_write = false;
            let mut corrupted = bytes.to_vec();
            let flip_at = corrupted.len() / 2;
            corrupted[flip_at] ^= 0x01;
            self.outbound.push(&corrupted);
        } else {
            self.outbound.push(bytes);
        }
        Ok(bytes.len())
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.inbound.pop_into(buf))
    }

    async fn readable(&mut self) {
        if self.inbound.len() > 0 {
            return;
        }
        self.inbound.notify.notified().await;
    }

    fn pending_tx(&self) -> usize {
        self.outbound.len()
    }

    fn pending_rx(&self) -> usize {
        self.inbound.len()
    }

    fn carrier_lost(&mut self) -> bool {
        self.carrier_lost_latch
    }

    fn cts_ok(&self) -> bool {
        self.cts_ok
    }

    fn assert_rts(&mut self, on: bool) {
        self.rts_asserted = on;
    }

    fn send_xoff(&mut self) {}
    fn send_xon(&mut self) {}

    fn take_error_counters(&mut self) -> ErrorCounters {
        std::mem::take(&mut self.errors)
    }

    fn io_region_enter(&mut self) -> u32 {
        self.io_level += 1;
        self.io_level
    }

    fn io_region_exit(&mut self) -> u32 {
        self.io_level = self.io_level.saturating_sub(1);
        self.io_level
    }

    async fn close(&mut self) {}
}
