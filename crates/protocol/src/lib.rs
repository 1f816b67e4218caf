#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Framing codec and packet type table for the HS/Link file-transfer
//! protocol: `DLE`-stuffing, CRC-32 packet integrity, and the fixed
//! single-byte packet-type table (`READY`, `FILE_HEADER`, `DATA`, `ACK`,
//! `NAK`, `EOF`, `SKIP`, `RESUME`, `TERMINATE`, `EXT_NAK`, `CHAT`).
//!
//! # Design
//!
//! This crate has no knowledge of files, windows, or state machines — that
//! lives in `hslink-engine`. It only knows how to turn a [`packet::Packet`]
//! into bytes and back, and how to detect a corrupted frame.
//!
//! # Examples
//!
//! ```
//! use hslink_protocol::alphabet::Alphabet;
//! use hslink_protocol::framing::{encode, FrameDecoder};
//! use hslink_protocol::packet::Packet;
//!
//! let packet = Packet::Eof;
//! let wire = encode(&packet, Alphabet::Classic);
//! let mut decoder = FrameDecoder::new();
//! let decoded = decoder.push_bytes(&wire);
//! assert_eq!(decoded.len(), 1);
//! assert_eq!(decoded[0].as_ref().unwrap(), &packet);
//! ```

/// Reserved bytes and the two escape alphabets.
pub mod alphabet;
/// CRC-32 over the unstuffed `TYPE ‖ payload` buffer.
pub mod crc;
/// Decoding/encoding errors.
pub mod error;
/// The DLE-stuffing codec.
pub mod framing;
/// The packet type table and wire (de)serialization.
pub mod packet;

pub use error::FramingError;
pub use packet::Packet;
