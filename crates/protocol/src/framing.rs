//! DLE-stuffing framing codec.
//!
//! Wire shape: `DLE, TYPE, STUFFED(payload ‖ crc32-le), DLE, END` (spec §4.2).
//! The type byte itself is never stuffed — it is drawn from the fixed
//! single-byte table in [`crate::packet`], which never collides with a
//! reserved byte. Everything after it (payload and trailing CRC) is
//! DLE-escaped per the negotiated [`Alphabet`].

use crate::alphabet::{Alphabet, DLE, END};
use crate::crc;
use crate::error::FramingError;
use crate::packet::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning for the opening `DLE` that starts the next packet.
    Idle,
    /// Opening `DLE` seen; the next raw byte is the type byte.
    ExpectType,
    /// Accumulating unstuffed payload bytes.
    InPacket,
    /// Just saw a `DLE` inside the payload; next byte disambiguates
    /// escape vs. terminator.
    AfterDle,
}

/// Incremental decoder: feed bytes one at a time, get packets out as they
/// complete.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    type_byte: u8,
    buf: Vec<u8>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            type_byte: 0,
            buf: Vec::new(),
        }
    }

    /// Feeds one byte from the wire. Returns `Some` exactly when a packet
    /// (successfully decoded, or a framing error) has just completed.
    pub fn push_byte(&mut self, byte: u8) -> Option<Result<Packet, FramingError>> {
        match self.state {
            State::Idle => {
                if byte == DLE {
                    self.state = State::ExpectType;
                }
                None
            }
            State::ExpectType => {
                if byte == DLE {
                    // Stray DLE before a type byte was established: resync.
                    None
                } else {
                    self.type_byte = byte;
                    self.buf.clear();
                    self.state = State::InPacket;
                    None
                }
            }
            State::InPacket => {
                if byte == DLE {
                    self.state = State::AfterDle;
                } else {
                    self.buf.push(byte);
                }
                None
            }
            State::AfterDle => {
                if byte == END {
                    self.state = State::Idle;
                    Some(self.finalize())
                } else if byte == DLE {
                    // Not a valid escape sequence mid-packet; resync.
                    self.state = State::ExpectType;
                    Some(Err(FramingError::StrayDle))
                } else {
                    self.buf.push(byte ^ 0x40);
                    self.state = State::InPacket;
                    None
                }
            }
        }
    }

    /// Feeds a whole slice, returning every packet (or error) that completed.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Result<Packet, FramingError>> {
        bytes.iter().filter_map(|&b| self.push_byte(b)).collect()
    }

    fn finalize(&mut self) -> Result<Packet, FramingError> {
        if self.buf.len() < 4 {
            return Err(FramingError::TooShort { len: self.buf.len() });
        }
        let split = self.buf.len() - 4;
        let payload = &self.buf[..split];
        let crc_bytes = &self.buf[split..];
        let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
        let computed = crc::compute(self.type_byte, payload);
        if expected != computed {
            return Err(FramingError::CrcMismatch { expected, computed });
        }
        Packet::from_wire(self.type_byte, payload)
    }
}

/// Encodes `packet` as a complete framed byte sequence under `alphabet`.
#[must_use]
pub fn encode(packet: &Packet, alphabet: Alphabet) -> Vec<u8> {
    let (type_byte, payload) = packet.to_wire();
    let crc = crc::compute(type_byte, &payload);

    let mut out = Vec::with_capacity(payload.len() + 8);
    out.push(DLE);
    out.push(type_byte);

    let stuff = |out: &mut Vec<u8>, byte: u8| {
        if alphabet.must_escape(byte) {
            out.push(DLE);
            out.push(byte ^ 0x40);
        } else {
            out.push(byte);
        }
    };
    for &byte in &payload {
        stuff(&mut out, byte);
    }
    for &byte in &crc.to_le_bytes() {
        stuff(&mut out, byte);
    }

    out.push(DLE);
    out.push(END);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::NakReason;
    use proptest::prelude::*;

    fn roundtrip(packet: &Packet, alphabet: Alphabet) -> Packet {
        let wire = encode(packet, alphabet);
        let mut decoder = FrameDecoder::new();
        let results = decoder.push_bytes(&wire);
        assert_eq!(results.len(), 1, "expected exactly one decoded packet");
        results.into_iter().next().unwrap().unwrap()
    }

    #[test]
    fn data_roundtrips_under_both_alphabets() {
        let packet = Packet::Data {
            seq: 9,
            payload: vec![0x10, 0x11, 0x13, 0x03, 0x00, 0x18, 0xff],
        };
        assert_eq!(roundtrip(&packet, Alphabet::Classic), packet);
        assert_eq!(roundtrip(&packet, Alphabet::Alternate), packet);
    }

    #[test]
    fn single_byte_flip_is_detected() {
        let packet = Packet::Data {
            seq: 1,
            payload: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let mut wire = encode(&packet, Alphabet::Classic);
        // Flip a payload byte that is not part of the DLE/END envelope.
        let flip_at = wire.len() / 2;
        wire[flip_at] ^= 0x01;
        let mut decoder = FrameDecoder::new();
        let results = decoder.push_bytes(&wire);
        assert!(
            results.iter().any(std::result::Result::is_err),
            "flipped stream should not decode cleanly"
        );
    }

    #[test]
    fn truncated_stream_yields_no_packet() {
        let packet = Packet::Eof;
        let wire = encode(&packet, Alphabet::Classic);
        let mut decoder = FrameDecoder::new();
        let results = decoder.push_bytes(&wire[..wire.len() - 2]);
        assert!(results.is_empty());
    }

    proptest! {
        #[test]
        fn data_packets_roundtrip_for_arbitrary_payloads(
            seq in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..4096),
            alt in any::<bool>(),
        ) {
            let alphabet = Alphabet::from_wire_bit(alt);
            let packet = Packet::Data { seq, payload };
            prop_assert_eq!(roundtrip(&packet, alphabet), packet);
        }

        #[test]
        fn nak_resume_roundtrips(seq in any::<u16>(), offset in any::<u64>()) {
            let packet = Packet::Nak { seq, reason: NakReason::Resume(offset) };
            prop_assert_eq!(roundtrip(&packet, Alphabet::Classic), packet);
        }
    }
}
