//! Installs the process-wide `tracing` subscriber: an `EnvFilter` seeded
//! from the `-v` repeat count, overridable by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Installs a compact, stderr-writing `tracing` subscriber. `verbose_level`
/// is the `-v` repeat count; `RUST_LOG`, if set, takes precedence.
pub fn init_tracing(verbose_level: u8) {
    let default_directive = match verbose_level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
