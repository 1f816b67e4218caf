use hslink_protocol::alphabet::Alphabet;
use hslink_protocol::packet::FlowPolicy;
use hslink_transport::IdleMethod;

/// Default block size in bytes (spec §3 "Send window").
pub const DEFAULT_BLOCK_SIZE: u16 = 1024;
/// Minimum block size accepted (`-Sn`).
pub const MIN_BLOCK_SIZE: u16 = 2;
/// Maximum block size accepted (`-Sn`).
pub const MAX_BLOCK_SIZE: u16 = 4096;
/// Default window width (`-Wn`).
pub const DEFAULT_MAX_WIND: u16 = 4;
/// Maximum window width accepted (`-Wn`).
pub const MAX_MAX_WIND: u16 = 1000;

/// The options negotiated (or locally configured) before `TRANSFER` begins.
///
/// A data struct with `const` builder methods and boolean predicate
/// helpers, rather than public mutable fields plus free functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub alphabet: Alphabet,
    pub max_wind: u16,
    pub block_size: u16,
    pub flow: FlowPolicy,
    pub idle_method: IdleMethod,
    pub require_carrier: bool,
    pub allow_overwrite: bool,
    pub resume_verify: bool,
    pub keep_aborted: bool,
    pub restore_mtime: bool,
    pub ack_every: u16,
    pub com_speed: u32,
    pub eff_speed: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::Classic,
            max_wind: DEFAULT_MAX_WIND,
            block_size: DEFAULT_BLOCK_SIZE,
            flow: FlowPolicy {
                cts_handshake: true,
                rts_handshake: true,
                xon_handshake: true,
                slow_handshake: false,
            },
            idle_method: IdleMethod::None,
            require_carrier: true,
            allow_overwrite: false,
            resume_verify: true,
            keep_aborted: false,
            restore_mtime: true,
            ack_every: 1,
            com_speed: 0,
            eff_speed: 0,
        }
    }
}

impl EngineOptions {
    /// `-Wn`: ACKs disabled entirely, sender streams continuously. P3 (exact
    /// on-disk byte equality) is then only best-effort, per spec §9's
    /// resolution of the `MaxWind = 0` open question.
    #[must_use]
    pub const fn acks_disabled(&self) -> bool {
        self.max_wind == 0
    }

    /// Worst-case round-trip timeout for one window's worth of data at the
    /// configured effective speed (spec §4.4 point 5), in milliseconds.
    #[must_use]
    pub fn window_round_timeout_ms(&self) -> u64 {
        let speed = self.eff_speed.max(1);
        let bits_per_window =
            u64::from(self.max_wind.max(1)) * u64::from(self.block_size) * 10;
        let ms = bits_per_window.saturating_mul(1000) / u64::from(speed);
        ms.max(250)
    }
}
