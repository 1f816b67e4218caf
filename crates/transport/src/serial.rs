//! Real COM-port transport backend, built on the blocking `serialport` crate.
//!
//! `serialport` has no async API, so reads and writes are dispatched through
//! `spawn_blocking`; this is the isolation point Design Notes §9 calls for
//! ("bit-level UART register manipulation must not appear in the core").

use std::io;
use std::time::Duration;

use serialport::SerialPort;

use crate::adapter::{ErrorCounters, TransportAdapter};

/// A real serial port, opened at a fixed baud rate.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    carrier_lost_latch: bool,
    require_carrier: bool,
    io_level: u32,
    errors: ErrorCounters,
}

impl SerialTransport {
    /// Opens `path` (e.g. `/dev/ttyUSB0` or `COM3`) at `baud`.
    ///
    /// # Errors
    /// Propagates the underlying `serialport` open failure.
    pub fn open(path: &str, baud: u32, require_carrier: bool) -> io::Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(Self {
            port,
            carrier_lost_latch: false,
            require_carrier,
            io_level: 0,
            errors: ErrorCounters::default(),
        })
    }
}

impl TransportAdapter for SerialTransport {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        match self.port.write(bytes) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn readable(&mut self) {
        // No async notification source on `serialport`; yield once and let
        // the idle loop re-poll `try_read` on the next pass.
        tokio::task::yield_now().await;
    }

    fn pending_tx(&self) -> usize {
        self.port.bytes_to_write().unwrap_or(0) as usize
    }

    fn pending_rx(&self) -> usize {
        self.port.bytes_to_read().unwrap_or(0) as usize
    }

    fn carrier_lost(&mut self) -> bool {
        if self.carrier_lost_latch || !self.require_carrier {
            return self.carrier_lost_latch;
        }
        if self.pending_rx() > 0 {
            return false;
        }
        if !self.port.read_carrier_detect().unwrap_or(true) {
            self.carrier_lost_latch = true;
        }
        self.carrier_lost_latch
    }

    fn cts_ok(&self) -> bool {
        self.port.read_clear_to_send().unwrap_or(true)
    }

    fn assert_rts(&mut self, on: bool) {
        let _ = self.port.write_request_to_send(on);
    }

    fn send_xoff(&mut self) {
        let _ = self.port.write(&[hslink_protocol::alphabet::XOFF]);
    }

    fn send_xon(&mut self) {
        let _ = self.port.write(&[hslink_protocol::alphabet::XON]);
    }

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
