#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The protocol engine: everything from the `READY` handshake through
//! per-file send/receive state machines to the batch coordinator that
//! stages a whole session (spec §4.3-§4.7). Generic over
//! [`hslink_transport::TransportAdapter`] so the same state machines drive
//! both the loopback test harness and a real serial port.
//!
//! # Design
//!
//! [`engine::Engine`] owns one [`batch::BatchCoordinator`], one
//! [`dispatch::Dispatcher`], and one [`window::SendWindow`] for the file
//! currently streaming out. Per-file behavior lives in [`send::SendSide`]
//! and [`recv::RecvSide`], which borrow a [`descriptor::OutgoingFile`] or
//! [`descriptor::IncomingFile`] for the duration of one call rather than
//! owning it, so the coordinator remains the single source of truth for
//! file lifecycle.

pub mod batch;
pub mod cancel;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod idle;
pub mod recv;
pub mod send;
pub mod window;

pub use batch::{BatchCoordinator, BatchState};
pub use cancel::CancelReason;
pub use config::EngineOptions;
pub use engine::{BatchCallbacks, Engine};
pub use error::EngineError;
