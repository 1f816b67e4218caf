#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The transport adapter boundary (spec §4.1): an opaque byte pipe with
//! non-blocking write/read, carrier/CTS queries, and flow-control signaling.
//! Everything OS- or hardware-specific lives here, never in
//! `hslink-engine` (Design Notes §9).
//!
//! # Design
//!
//! [`adapter::TransportAdapter`] is the trait the engine is generic over.
//! [`loopback::LoopbackTransport`] is an in-memory back-to-back pair used by
//! tests. [`serial::SerialTransport`] (behind the `serial` feature) drives a
//! real COM port via the `serialport` crate.

pub mod adapter;
pub mod loopback;
#[cfg(feature = "serial")]
pub mod serial;

pub use adapter::{ErrorCounters, IdleMethod, SlowHandshakeGuard, TransportAdapter, MAX_FRAMING, MAX_OVERRUN};
pub use loopback::LoopbackTransport;
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
