//! Global verbosity state and the diagnostic event buffer.
//!
//! A single process runs one batch at a time, so a process-global
//! `VerbosityConfig` (set once via [`init`]) plus a buffer of emitted
//! [`DiagnosticEvent`]s (drained via [`drain_events`]) is the same shape the
//! teacher's logging crate tests expect, rather than threading a config
//! handle through every call site.

use std::sync::{Mutex, OnceLock};

use crate::verbosity::{DebugFlag, InfoFlag, VerbosityConfig};

/// One emitted diagnostic, captured for tests and for any sink that wants
/// the structured form rather than a formatted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    Info {
        flag: InfoFlag,
        level: u8,
        message: String,
    },
    Debug {
        flag: DebugFlag,
        level: u8,
        message: String,
    },
}

struct State {
    config: VerbosityConfig,
    events: Vec<DiagnosticEvent>,
}

fn state() -> &'static Mutex<State> {
    static STATE: OnceLock<Mutex<State>> = OnceLock::new();
    STATE.get_or_init(|| {
        Mutex::new(State {
            config: VerbosityConfig::default(),
            events: Vec::new(),
        })
    })
}

/// Installs the active verbosity configuration and clears any previously
/// buffered events.
pub fn init(config: VerbosityConfig) {
    let mut s = state().lock().unwrap();
    s.config = config;
    s.events.clear();
}

/// Returns every event emitted since the last [`init`] or [`drain_events`]
/// call, removing them from the buffer.
#[must_use]
pub fn drain_events() -> Vec<DiagnosticEvent> {
    let mut s = state().lock().unwrap();
    std::mem::take(&mut s.events)
}

#[must_use]
pub fn info_gte(flag: InfoFlag, level: u8) -> bool {
    state().lock().unwrap().config.info_gte(flag, level)
}

#[must_use]
pub fn debug_gte(flag: DebugFlag, level: u8) -> bool {
    state().lock().unwrap().config.debug_gte(flag, level)
}

/// Records an info-category diagnostic if `level` passes the active
/// configuration for `flag`; also forwards to `tracing` when the `tracing`
/// feature is enabled.
pub fn info_log(flag: InfoFlag, level: u8, message: impl Into<String>) {
    let message = message.into();
    let mut s = state().lock().unwrap();
    if s.config.info_gte(flag, level) {
        #[cfg(feature = "tracing")]
        tracing::info!(category = ?flag, level, "{message}");
        s.events.push(DiagnosticEvent::Info {
            flag,
            level,
            message,
        });
    }
}

/// Records a debug-category diagnostic if `level` passes the active
/// configuration for `flag`.
pub fn debug_log(flag: DebugFlag, level: u8, message: impl Into<String>) {
    let message = message.into();
    let mut s = state().lock().unwrap();
    if s.config.debug_gte(flag, level) {
        #[cfg(feature = "tracing")]
        tracing::debug!(category = ?flag, level, "{message}");
        s.events.push(DiagnosticEvent::Debug {
            flag,
            level,
            message,
        });
    }
}
