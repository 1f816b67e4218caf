//! Packet type table and wire encoding for packet payloads.
//!
//! Multi-byte fields are little-endian (spec §6 "Wire format"). Framing
//! (DLE-stuffing, CRC, `DLE END` terminator) lives in [`crate::framing`];
//! this module only converts between a typed [`Packet`] and the
//! `(type_byte, payload_bytes)` pair the framing codec carries.

use crate::alphabet::Alphabet;
use crate::error::FramingError;

const TYPE_READY: u8 = 0x01;
const TYPE_FILE_HEADER: u8 = 0x02;
const TYPE_DATA: u8 = 0x03;
const TYPE_ACK: u8 = 0x04;
const TYPE_NAK: u8 = 0x05;
const TYPE_EOF: u8 = 0x06;
const TYPE_SKIP: u8 = 0x07;
const TYPE_RESUME: u8 = 0x08;
const TYPE_TERMINATE: u8 = 0x09;
const TYPE_EXT_NAK: u8 = 0x0a;
const TYPE_CHAT: u8 = 0x0b;

/// Flow-control policy bits exchanged during the `READY` handshake
/// (modeled on `display_settings()` in the original source, which prints
/// exactly these four booleans alongside `MaxWind`/`BlockSize`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowPolicy {
    pub cts_handshake: bool,
    pub rts_handshake: bool,
    pub xon_handshake: bool,
    pub slow_handshake: bool,
}

impl FlowPolicy {
    fn to_bits(self) -> u8 {
        (self.cts_handshake as u8)
            | (self.rts_handshake as u8) << 1
            | (self.xon_handshake as u8) << 2
            | (self.slow_handshake as u8) << 3
    }

    const fn from_bits(bits: u8) -> Self {
        Self {
            cts_handshake: bits & 0x1 != 0,
            rts_handshake: bits & 0x2 != 0,
            xon_handshake: bits & 0x4 != 0,
            slow_handshake: bits & 0x8 != 0,
        }
    }
}

/// Why a `DATA` packet (or file header) was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NakReason {
    /// `FILE_HEADER` for a name that already exists and overwrite is disallowed.
    Duplicate,
    /// A gap in the sequence space, or a CRC/framing failure on the wire.
    Framing,
    /// Resume from a given byte offset (either file or window resume).
    Resume(u64),
}

impl NakReason {
    const fn tag(self) -> u8 {
        match self {
            Self::Duplicate => 0,
            Self::Framing => 1,
            Self::Resume(_) => 2,
        }
    }
}

/// One decoded HS/Link protocol packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Ready {
        alphabet: Alphabet,
        max_wind: u16,
        block_size: u16,
        flow: FlowPolicy,
    },
    FileHeader {
        remote_name: String,
        size: u64,
        mtime: i64,
        first_offset: u64,
    },
    Data {
        seq: u16,
        payload: Vec<u8>,
    },
    Ack {
        seq: u16,
    },
    Nak {
        seq: u16,
        reason: NakReason,
    },
    Eof,
    Skip,
    Resume {
        offset: u64,
    },
    Terminate,
    ExtNak {
        diagnostic: String,
    },
    Chat {
        text: String,
    },
}

impl Packet {
    /// Splits this packet into its wire type byte and unstuffed payload.
    #[must_use]
    pub fn to_wire(&self) -> (u8, Vec<u8>) {
        match self {
            Self::Ready {
                alphabet,
                max_wind,
                block_size,
                flow,
            } => {
                let mut buf = Vec::with_capacity(6);
                buf.push(u8::from(alphabet.as_wire_bit()));
                buf.extend_from_slice(&max_wind.to_le_bytes());
                buf.extend_from_slice(&block_size.to_le_bytes());
                buf.push(flow.to_bits());
                (TYPE_READY, buf)
            }
            Self::FileHeader {
                remote_name,
                size,
                mtime,
                first_offset,
            } => {
                let name = remote_name.as_bytes();
                let mut buf = Vec::with_capacity(8 + 8 + 8 + 2 + name.len());
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(&mtime.to_le_bytes());
                buf.extend_from_slice(&first_offset.to_le_bytes());
                buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
                buf.extend_from_slice(name);
                (TYPE_FILE_HEADER, buf)
            }
            Self::Data { seq, payload } => {
                let mut buf = Vec::with_capacity(2 + payload.len());
                buf.extend_from_slice(&seq.to_le_bytes());
                buf.extend_from_slice(payload);
                (TYPE_DATA, buf)
            }
            Self::Ack { seq } => (TYPE_ACK, seq.to_le_bytes().to_vec()),
            Self::Nak { seq, reason } => {
                let mut buf = Vec::with_capacity(11);
                buf.extend_from_slice(&seq.to_le_bytes());
                buf.push(reason.tag());
                if let NakReason::Resume(offset) = reason {
                    buf.extend_from_slice(&offset.to_le_bytes());
                }
                (TYPE_NAK, buf)
            }
            Self::Eof => (TYPE_EOF, Vec::new()),
            Self::Skip => (TYPE_SKIP, Vec::new()),
            Self::Resume { offset } => (TYPE_RESUME, offset.to_le_bytes().to_vec()),
            Self::Terminate => (TYPE_TERMINATE, Vec::new()),
            Self::ExtNak { diagnostic } => (TYPE_EXT_NAK, diagnostic.as_bytes().to_vec()),
            Self::Chat { text } => (TYPE_CHAT, text.as_bytes().to_vec()),
        }
    }

    /// Reassembles a [`Packet`] from a wire type byte and its unstuffed payload.
    ///
    /// # Errors
    /// Returns [`FramingError::UnknownType`] for a type byte outside the
    /// fixed table, or [`FramingError::TooShort`] if a fixed-size payload is
    /// truncated. Unknown types are a framing error per spec §3.
    pub fn from_wire(type_byte: u8, payload: &[u8]) -> Result<Self, FramingError> {
        match type_byte {
            TYPE_READY => {
                require_len(payload, 6)?;
                Ok(Self::Ready {
                    alphabet: Alphabet::from_wire_bit(payload[0] != 0),
                    max_wind: u16::from_le_bytes([payload[1], payload[2]]),
                    block_size: u16::from_le_bytes([payload[3], payload[4]]),
                    flow: FlowPolicy::from_bits(payload[5]),
                })
            }
            TYPE_FILE_HEADER => {
                require_len(payload, 26)?;
                let size = u64::from_le_bytes(payload[0..8].try_into().unwrap());
                let mtime = i64::from_le_bytes(payload[8..16].try_into().unwrap());
                let first_offset = u64::from_le_bytes(payload[16..24].try_into().unwrap());
                let name_len = u16::from_le_bytes([payload[24], payload[25]]) as usize;
                require_len(payload, 26 + name_len)?;
                let remote_name = String::from_utf8_lossy(&payload[26..26 + name_len]).into_owned();
                Ok(Self::FileHeader {
                    remote_name,
                    size,
                    mtime,
                    first_offset,
                })
            }
            TYPE_DATA => {
                require_len(payload, 2)?;
                let seq = u16::from_le_bytes([payload[0], payload[1]]);
                Ok(Self::Data {
                    seq,
                    payload: payload[2..].to_vec(),
                })
            }
            TYPE_ACK => {
                require_len(payload, 2)?;
                Ok(Self::Ack {
                    seq: u16::from_le_bytes([payload[0], payload[1]]),
                })
            }
            TYPE_NAK => {
                require_len(payload, 3)?;
                let seq = u16::from_le_bytes([payload[0], payload[1]]);
                let reason = match payload[2] {
                    0 => NakReason::Duplicate,
                    1 => NakReason::Framing,
                    2 => {
                        require_len(payload, 11)?;
                        NakReason::Resume(u64::from_le_bytes(payload[3..11].try_into().unwrap()))
                    }
                    other => return Err(FramingError::UnknownType(other)),
                };
                Ok(Self::Nak { seq, reason })
            }
            TYPE_EOF => Ok(Self::Eof),
            TYPE_SKIP => Ok(Self::Skip),
            TYPE_RESUME => {
                require_len(payload, 8)?;
                Ok(Self::Resume {
                    offset: u64::from_le_bytes(payload[0..8].try_into().unwrap()),
                })
            }
            TYPE_TERMINATE => Ok(Self::Terminate),
            TYPE_EXT_NAK => Ok(Self::ExtNak {
                diagnostic: String::from_utf8_lossy(payload).into_owned(),
            }),
            TYPE_CHAT => Ok(Self::Chat {
                text: String::from_utf8_lossy(payload).into_owned(),
            }),
            other => Err(FramingError::UnknownType(other)),
        }
    }
}

fn require_len(payload: &[u8], min: usize) -> Result<(), FramingError> {
    if payload.len() < min {
        Err(FramingError::TooShort { len: payload.len() })
    } else {
        Ok(())
    }
}
