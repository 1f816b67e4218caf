#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Verbosity flags (`--info`/`--debug`/`-v`), the diagnostic event buffer
//! tests read back, the `HSERR` log-append sink, and (behind the `tracing`
//! feature) the process-wide `tracing` subscriber.
//!
//! # Design
//!
//! A process-global [`VerbosityConfig`] installed once via [`init`],
//! per-category levels checked with [`info_gte`]/[`debug_gte`], and
//! [`info_log!`]/[`debug_log!`] as the call-site macros, with HS/Link's
//! own categories ([`InfoFlag`], [`DebugFlag`]).

pub mod events;
pub mod hserr;
mod macros;
#[cfg(feature = "tracing")]
pub mod subscriber;
pub mod verbosity;

pub use events::{debug_gte, debug_log, drain_events, info_gte, info_log, init, DiagnosticEvent};
pub use hserr::log_error;
#[cfg(feature = "tracing")]
pub use subscriber::init_tracing;
pub use verbosity::{Debug, DebugFlag, Info, InfoFlag, VerbosityConfig};
