use thiserror::Error;

/// Errors raised while decoding a framed byte stream.
///
/// These are always non-fatal from the engine's point of view: the caller
/// replies with a `NAK` carrying the last successfully-received sequence
/// number so the peer can replay (spec §4.2).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FramingError {
    #[error("packet too short: {len} bytes (minimum is 5)")]
    TooShort { len: usize },

    #[error("crc mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },

    #[error("unknown packet type byte {0:#04x}")]
    UnknownType(u8),

    #[error("stray DLE at start of packet, resynchronizing")]
    StrayDle,

    #[error("stream truncated inside a packet")]
    Truncated,
}
