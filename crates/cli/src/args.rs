//! Command-line surface (spec §6). Flag letters follow the historical
//! HS/Link command line; `-@file` and `-LF` are explained in
//! [`crate::config_file`] and the `hserr` sink respectively.

use std::path::PathBuf;

use clap::Parser;

use hslink_engine::config::{EngineOptions, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_WIND};
use hslink_protocol::alphabet::Alphabet;
use hslink_protocol::packet::FlowPolicy;
use hslink_transport::IdleMethod;

#[derive(Debug, Parser, Clone)]
#[command(name = "hslink", about = "Bidirectional, windowed, error-correcting file transfer over a serial link")]
pub struct Cli {
    /// Files to send. A batch with none queued is still a valid receive-only run.
    pub files: Vec<PathBuf>,

    /// `-P`: serial port number (device index), default 1.
    #[arg(short = 'P', value_name = "N", default_value_t = 1)]
    pub port: u32,

    /// `-B`: requested line speed in bits per second.
    #[arg(short = 'B', value_name = "BAUD", default_value_t = 19200)]
    pub com_speed: u32,

    /// `-E`: effective throughput used for window-round timeout math, in
    /// bits per second; defaults to `-B` if unset.
    #[arg(short = 'E', value_name = "BAUD")]
    pub eff_speed: Option<u32>,

    /// `-S`: block size in bytes, `MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE`.
    #[arg(short = 'S', value_name = "N", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u16,

    /// `-W`: window width, `0..=MAX_MAX_WIND`. `0` disables acknowledgement
    /// entirely (spec §9's `MaxWind = 0` resolution: best-effort only).
    #[arg(short = 'W', value_name = "N", default_value_t = DEFAULT_MAX_WIND)]
    pub max_wind: u16,

    /// `-A`: negotiate the alternate (fully 8-bit-unsafe-channel) escape
    /// alphabet instead of the classic one.
    #[arg(short = 'A')]
    pub alternate_alphabet: bool,

    /// `-HC`: require CTS handshake.
    #[arg(long = "hc")]
    pub cts_handshake: bool,
    /// `-HR`: require RTS handshake.
    #[arg(long = "hr")]
    pub rts_handshake: bool,
    /// `-HS`: start in slow handshake (XOFF/RTS held during local disk I/O).
    #[arg(long = "hs")]
    pub slow_handshake: bool,
    /// `-HX`: require XON/XOFF handshake.
    #[arg(long = "hx")]
    pub xon_handshake: bool,

    /// `-FT`: send an `ACK` every N blocks instead of every block.
    #[arg(long = "ft", value_name = "N", default_value_t = 1)]
    pub ack_every: u16,

    /// `-K`: keep a partially received file on abort instead of discarding it.
    #[arg(short = 'K')]
    pub keep_aborted: bool,

    /// `-O`: allow overwriting a file that already exists at the destination.
    #[arg(short = 'O')]
    pub allow_overwrite: bool,

    /// `-R`: verify a partial file's tail before accepting a resume offset.
    #[arg(short = 'R')]
    pub resume_verify: bool,

    /// `-U`: directory incoming files are written into.
    #[arg(short = 'U', value_name = "DIR")]
    pub upload_dir: Option<PathBuf>,

    /// `-I`: idle method, `0..=4` (spec §4.7; all collapse to a cooperative
    /// yield on this runtime).
    #[arg(short = 'I', value_name = "N", default_value_t = 0)]
    pub idle_method: u8,

    /// `-T`: restore the remote file's modification time on received files.
    #[arg(short = 'T')]
    pub restore_mtime: bool,

    /// `-C`: require carrier detect; without it, carrier loss is ignored.
    #[arg(short = 'C')]
    pub require_carrier: bool,

    /// `-@file`: read additional command-line tokens from `file`, splicing
    /// them in where `-@file` appeared (spec §6, [`crate::config_file`]).
    /// Command-line flags after the splice point win on conflict.
    #[arg(short = '@', value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// `-LF`: path to append `HSERR`-style diagnostics to, equivalent to
    /// setting the `HSERR` environment variable for this run.
    #[arg(long = "lf", value_name = "PATH")]
    pub error_log: Option<PathBuf>,

    /// Repeatable `-v` for `--info`/`--debug` verbosity (spec §6 "Diagnostics").
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// `--info=FLAG[LEVEL][,...]`.
    #[arg(long = "info", value_delimiter = ',')]
    pub info_flags: Vec<String>,

    /// `--debug=FLAG[LEVEL][,...]`.
    #[arg(long = "debug", value_delimiter = ',')]
    pub debug_flags: Vec<String>,
}

impl Cli {
    /// Builds the negotiated [`EngineOptions`] from parsed flags.
    ///
    /// # Errors
    /// Returns an error if `-I` names an unrecognized idle method.
    pub fn to_engine_options(&self) -> Result<EngineOptions, String> {
        let idle_method =
            IdleMethod::from_index(self.idle_method).ok_or_else(|| format!("invalid idle method: -I{}", self.idle_method))?;
        Ok(EngineOptions {
            alphabet: if self.alternate_alphabet {
                Alphabet::Alternate
            } else {
                Alphabet::Classic
            },
            max_wind: self.max_wind,
            block_size: self.block_size,
            flow: FlowPolicy {
                cts_handshake: self.cts_handshake,
                rts_handshake: self.rts_handshake,
                xon_handshake: self.xon_handshake,
                slow_handshake: self.slow_handshake,
            },
            idle_method,
            require_carrier: self.require_carrier,
            allow_overwrite: self.allow_overwrite,
            resume_verify: self.resume_verify,
            keep_aborted: self.keep_aborted,
            restore_mtime: self.restore_mtime,
            ack_every: self.ack_every.max(1),
            com_speed: self.com_speed,
            eff_speed: self.eff_speed.unwrap_or(self.com_speed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_cleanly() {
        let cli = Cli::parse_from(["hslink"]);
        let opts = cli.to_engine_options().unwrap();
        assert_eq!(opts.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(opts.max_wind, DEFAULT_MAX_WIND);
    }

    #[test]
    fn window_and_block_size_flags_are_applied() {
        let cli = Cli::parse_from(["hslink", "-W8", "-S2048", "-A"]);
        let opts = cli.to_engine_options().unwrap();
        assert_eq!(opts.max_wind, 8);
        assert_eq!(opts.block_size, 2048);
        assert_eq!(opts.alphabet, Alphabet::Alternate);
    }

    #[test]
    fn eff_speed_defaults_to_com_speed() {
        let cli = Cli::parse_from(["hslink", "-B9600"]);
        let opts = cli.to_engine_options().unwrap();
        assert_eq!(opts.eff_speed, 9600);
    }

    #[test]
    fn invalid_idle_method_is_rejected() {
        let cli = Cli::parse_from(["hslink", "-I9"]);
        assert!(cli.to_engine_options().is_err());
    }
}
