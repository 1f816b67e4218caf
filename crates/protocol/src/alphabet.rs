/// Control byte `XON` (resume transmission).
pub const XON: u8 = 0x11;
/// Control byte `XOFF` (pause transmission).
pub const XOFF: u8 = 0x13;
/// Reserved framing prefix byte.
pub const DLE: u8 = 0x10;
/// Frame terminator, always escaped after a `DLE`.
pub const END: u8 = 0x03;
/// Six consecutive bytes of this value cancels the link (spec §4.6, §8 scenario 6).
pub const CAN: u8 = 0x18;
/// Consecutive identical `CAN` bytes required to trigger cancellation.
pub const CANCEL_COUNT: u32 = 6;

/// Which set of bytes require `DLE`-escaping on the wire.
///
/// Negotiated once during the `READY` handshake and fixed for the lifetime
/// of the transmit direction (spec §3 invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// Escapes only `{DLE, XON, XOFF, END}`.
    Classic,
    /// Additionally escapes the remaining C0 control codes, for channels
    /// that are not 8-bit clean.
    Alternate,
}

impl Alphabet {
    /// Returns true if `byte` must be escaped under this alphabet.
    #[must_use]
    pub const fn must_escape(self, byte: u8) -> bool {
        match self {
            Self::Classic => matches!(byte, DLE | XON | XOFF | END),
            Self::Alternate => matches!(byte, DLE | XON | XOFF | END) || byte < 0x20,
        }
    }

    /// Wire value of the alphabet bit carried in the `READY` handshake payload.
    #[must_use]
    pub const fn as_wire_bit(self) -> bool {
        matches!(self, Self::Alternate)
    }

    #[must_use]
    pub const fn from_wire_bit(bit: bool) -> Self {
        if bit { Self::Alternate } else { Self::Classic }
    }
}
