use std::io;

/// The five historical idle strategies from `-In` (spec §6, `HSIDLE.C`).
///
/// Under a cooperative single-thread scheduler these selected an OS-specific
/// timeslice-yield primitive (DesqView, DoubleDOS, Windows/OS2 VCPI). On a
/// modern async runtime every variant other than `None` reduces to the same
/// `tokio::task::yield_now().await` (see `SPEC_FULL.md` §4.1); the enum is
/// kept only so `-In` remains a recognized, round-trippable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleMethod {
    /// `-I0`: never give up idle time voluntarily.
    #[default]
    None,
    /// `-I1`: poll for keyboard input during idle time.
    KeyboardPoll,
    /// `-I2`: give up timeslice (historically DesqView).
    DesqView,
    /// `-I3`: give up timeslice (historically DoubleDOS).
    DoubleDos,
    /// `-I4`: release the virtual-machine timeslice (historically Windows/OS2/VCPI).
    Windows,
}

impl IdleMethod {
    /// Parses the `-In` numeric argument (0-4).
    #[must_use]
    pub const fn from_index(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::None),
            1 => Some(Self::KeyboardPoll),
            2 => Some(Self::DesqView),
            3 => Some(Self::DoubleDos),
            4 => Some(Self::Windows),
            _ => None,
        }
    }
}

/// Line-error counters accumulated by the adapter and drained once per idle
/// pass (spec §4.1, `ComReportErrors()` in `HSCOMM.C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorCounters {
    pub overrun: u32,
    pub framing: u32,
    pub break_count: u32,
}

/// Once this many overrun errors have accumulated the engine auto-enables
/// slow handshake (`MAX_OVERRUN` in the original source).
pub const MAX_OVERRUN: u32 = 10;
/// Once the framing-error count exceeds this the engine aborts the link
/// with `CancelReason::FramingErrors` (`MAX_FRAMING` in the original source).
pub const MAX_FRAMING: u32 = 25;

/// The opaque byte-pipe contract the protocol engine is built against
/// (spec §4.1). Implementations: [`crate::loopback::LoopbackTransport`] for
/// tests, and (behind the `serial` feature)
/// [`crate::serial::SerialTransport`] for a real COM port.
///
/// `write` and `try_read` must never block indefinitely: a transport that
/// cannot accept/produce all the requested bytes right now returns a short
/// count, and the caller retries from the idle loop.
pub trait TransportAdapter: Send {
    /// Submits bytes for transmission, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = io::Result<usize>> + Send;

    /// Non-blocking read of whatever bytes are already buffered.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Suspends until more bytes are likely available, re-entering the
    /// cooperative scheduler exactly once (a suspension point per spec §5).
    fn readable(&mut self) -> impl std::future::Future<Output = ()> + Send;

    /// Bytes still queued for transmission.
    fn pending_tx(&self) -> usize;
    /// Bytes already received but not yet consumed via `try_read`.
    fn pending_rx(&self) -> usize;

    /// Sticky carrier-loss latch: once true, stays true for the adapter's
    /// lifetime (`ComCarrierLost()` in `HSCOMM.C` only polls hardware while
    /// no receive data is pending, and only once `RequireCarrier` is set).
    fn carrier_lost(&mut self) -> bool;
    /// Whether the remote is presenting clear-to-send.
    fn cts_ok(&self) -> bool;
    /// Raises or lowers RTS to the peer.
    fn assert_rts(&mut self, on: bool);
    /// Sends an XOFF control byte.
    fn send_xoff(&mut self);
    /// Sends an XON control byte.
    fn send_xon(&mut self);

    /// Drains and resets the line-error counters.
    fn take_error_counters(&mut self) -> ErrorCounters;

    /// Enters a (possibly nested) slow-handshake region, lowering RTS and/or
    /// sending XOFF only on the outermost entry. Returns the new nesting depth.
    fn io_region_enter(&mut self) -> u32;
    /// Exits one level of a slow-handshake region, releasing flow control
    /// only once the nesting depth returns to zero. Returns the new depth.
    fn io_region_exit(&mut self) -> u32;

    /// Closes the underlying transport.
    fn close(&mut self) -> impl std::future::Future<Output = ()> + Send;
}

/// RAII guard for a slow-handshake region (`ComIoStart`/`ComIoEnd` in
/// `HSCOMM.C`). Nested guards on the same adapter only release flow control
/// when the outermost guard drops.
pub struct SlowHandshakeGuard<'a, T: TransportAdapter> {
    adapter: &'a mut T,
}

impl<'a, T: TransportAdapter> SlowHandshakeGuard<'a, T> {
    pub fn enter(adapter: &'a mut T) -> Self {
        adapter.io_region_enter();
        Self { adapter }
    }
}

impl<T: TransportAdapter> Drop for SlowHandshakeGuard<'_, T> {
    fn drop(&mut self) {
        self.adapter.io_region_exit();
    }
}
