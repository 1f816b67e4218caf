//! Verbosity configuration: per-category info/debug levels, modeled on the
//! teacher's `VerbosityConfig`/`InfoFlag`/`DebugFlag` shape (inferred from
//! its test suite, since no source survived in the retrieved pack), with
//! HS/Link-relevant categories in place of rsync's.

/// `--info=FLAG[LEVEL]` categories (spec §6, `HSDISP.C`'s transfer/status line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoFlag {
    /// A file header, or the whole-batch enumeration, was staged.
    Batch,
    /// A `DATA` block went out.
    Send,
    /// A `DATA` block came in.
    Recv,
    /// The remote filename currently streaming.
    Name,
    /// Byte-count progress ticks.
    Progress,
    /// End-of-batch summary counters.
    Stats,
    /// Everything that doesn't fit another category.
    Misc,
    /// A `RESUME` offset was negotiated.
    Resume,
}

/// `--debug=FLAG[LEVEL]` categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugFlag {
    /// Transport adapter I/O: opens, closes, carrier/CTS polling.
    Transport,
    /// Framing codec: DLE-stuffing, CRC mismatches.
    Framing,
    /// Send/receive window bookkeeping.
    Window,
    /// `READY` handshake negotiation.
    Handshake,
    /// The cooperative idle pass.
    Idle,
    /// XON/XOFF/RTS/CTS flow control.
    Flow,
    /// Cancellation (carrier loss, six-`CAN`, keyboard).
    Cancel,
}

/// Per-category info levels (spec §6). Field order mirrors [`InfoFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Info {
    pub batch: u8,
    pub send: u8,
    pub recv: u8,
    pub name: u8,
    pub progress: u8,
    pub stats: u8,
    pub misc: u8,
    pub resume: u8,
}

impl Info {
    pub fn set_all(&mut self, level: u8) {
        *self = Self {
            batch: level,
            send: level,
            recv: level,
            name: level,
            progress: level,
            stats: level,
            misc: level,
            resume: level,
        };
    }

    const fn get(&self, flag: InfoFlag) -> u8 {
        match flag {
            InfoFlag::Batch => self.batch,
            InfoFlag::Send => self.send,
            InfoFlag::Recv => self.recv,
            InfoFlag::Name => self.name,
            InfoFlag::Progress => self.progress,
            InfoFlag::Stats => self.stats,
            InfoFlag::Misc => self.misc,
            InfoFlag::Resume => self.resume,
        }
    }

    fn set(&mut self, flag: InfoFlag, level: u8) {
        match flag {
            InfoFlag::Batch => self.batch = level,
            InfoFlag::Send => self.send = level,
            InfoFlag::Recv => self.recv = level,
            InfoFlag::Name => self.name = level,
            InfoFlag::Progress => self.progress = level,
            InfoFlag::Stats => self.stats = level,
            InfoFlag::Misc => self.misc = level,
            InfoFlag::Resume => self.resume = level,
        }
    }
}

/// Per-category debug levels. Field order mirrors [`DebugFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Debug {
    pub transport: u8,
    pub framing: u8,
    pub window: u8,
    pub handshake: u8,
    pub idle: u8,
    pub flow: u8,
    pub cancel: u8,
}

impl Debug {
    pub fn set_all(&mut self, level: u8) {
        *self = Self {
            transport: level,
            framing: level,
            window: level,
            handshake: level,
            idle: level,
            flow: level,
            cancel: level,
        };
    }

    const fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Transport => self.transport,
            DebugFlag::Framing => self.framing,
            DebugFlag::Window => self.window,
            DebugFlag::Handshake => self.handshake,
            DebugFlag::Idle => self.idle,
            DebugFlag::Flow => self.flow,
            DebugFlag::Cancel => self.cancel,
        }
    }

    fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Transport => self.transport = level,
            DebugFlag::Framing => self.framing = level,
            DebugFlag::Window => self.window = level,
            DebugFlag::Handshake => self.handshake = level,
            DebugFlag::Idle => self.idle = level,
            DebugFlag::Flow => self.flow = level,
            DebugFlag::Cancel => self.cancel = level,
        }
    }
}

/// The full verbosity configuration: what `-v`/`-q`, `--info`, and `--debug`
/// (or their `-@file` equivalents) resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerbosityConfig {
    pub info: Info,
    pub debug: Debug,
}

impl VerbosityConfig {
    /// Maps a `-v` repeat count to a starting info/debug configuration.
    /// `--info`/`--debug` tokens applied afterward override individual
    /// categories (spec §6 "Diagnostics").
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        if level == 0 {
            config.info.name = 1;
            return config;
        }
        config.info.set_all(1);
        if level >= 2 {
            config.info.progress = 2;
            config.info.stats = 2;
        }
        if level >= 3 {
            config.debug.set_all(1);
        }
        config
    }

    /// Applies one `--info` token, e.g. `"name2"`, `"stats"`, `"ALL"`, `"NONE"`.
    ///
    /// # Errors
    /// Returns an error string naming the unrecognized flag or malformed level.
    pub fn apply_info_flag(&mut self, token: &str) -> Result<(), String> {
        if token.eq_ignore_ascii_case("ALL") {
            self.info.set_all(1);
            return Ok(());
        }
        if token.eq_ignore_ascii_case("NONE") {
            self.info.set_all(0);
            return Ok(());
        }
        let (flag, level) = split_flag_level(token, &[
            ("batch", InfoFlag::Batch),
            ("send", InfoFlag::Send),
            ("recv", InfoFlag::Recv),
            ("name", InfoFlag::Name),
            ("progress", InfoFlag::Progress),
            ("stats", InfoFlag::Stats),
            ("misc", InfoFlag::Misc),
            ("resume", InfoFlag::Resume),
        ])
        .ok_or_else(|| format!("unknown info flag: {token}"))?;
        self.info.set(flag, level);
        Ok(())
    }

    /// Applies one `--debug` token, analogous to [`Self::apply_info_flag`].
    ///
    /// # Errors
    /// Returns an error string naming the unrecognized flag or malformed level.
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), String> {
        if token.eq_ignore_ascii_case("ALL") {
            self.debug.set_all(1);
            return Ok(());
        }
        if token.eq_ignore_ascii_case("NONE") {
            self.debug.set_all(0);
            return Ok(());
        }
        let (flag, level) = split_flag_level(token, &[
            ("transport", DebugFlag::Transport),
            ("framing", DebugFlag::Framing),
            ("window", DebugFlag::Window),
            ("handshake", DebugFlag::Handshake),
            ("idle", DebugFlag::Idle),
            ("flow", DebugFlag::Flow),
            ("cancel", DebugFlag::Cancel),
        ])
        .ok_or_else(|| format!("unknown debug flag: {token}"))?;
        self.debug.set(flag, level);
        Ok(())
    }

    #[must_use]
    pub const fn info_gte(&self, flag: InfoFlag, level: u8) -> bool {
        self.info.get(flag) >= level
    }

    #[must_use]
    pub const fn debug_gte(&self, flag: DebugFlag, level: u8) -> bool {
        self.debug.get(flag) >= level
    }
}

/// Splits `"name2"` into `(Name, 2)`, or `"name"` into `(Name, 1)`. The flag
/// name is the longest matching prefix from `table`; the remainder, if any,
/// must be a valid `u8`.
fn split_flag_level<F: Copy>(token: &str, table: &[(&str, F)]) -> Option<(F, u8)> {
    let (name, flag) = table
        .iter()
        .filter(|(name, _)| token.starts_with(name))
        .max_by_key(|(name, _)| name.len())
        .copied()?;
    let rest = &token[name.len()..];
    let level = if rest.is_empty() {
        1
    } else {
        rest.parse::<u8>().ok()?
    };
    Some((flag, level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_flag_defaults_to_level_1() {
        let mut c = VerbosityConfig::default();
        c.apply_info_flag("send").unwrap();
        assert_eq!(c.info.send, 1);
    }

    #[test]
    fn flag_with_explicit_level() {
        let mut c = VerbosityConfig::default();
        c.apply_info_flag("name2").unwrap();
        assert_eq!(c.info.name, 2);
    }

    #[test]
    fn all_keyword_sets_every_info_category() {
        let mut c = VerbosityConfig::default();
        c.apply_info_flag("ALL").unwrap();
        assert_eq!(c.info.batch, 1);
        assert_eq!(c.info.resume, 1);
    }

    #[test]
    fn none_keyword_clears_debug() {
        let mut c = VerbosityConfig::default();
        c.debug.set_all(3);
        c.apply_debug_flag("none").unwrap();
        assert_eq!(c.debug.transport, 0);
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let mut c = VerbosityConfig::default();
        assert!(c.apply_info_flag("bogus").is_err());
    }

    #[test]
    fn from_verbose_level_0_enables_only_name() {
        let c = VerbosityConfig::from_verbose_level(0);
        assert_eq!(c.info.name, 1);
        assert_eq!(c.info.send, 0);
    }

    #[test]
    fn from_verbose_level_3_enables_debug() {
        let c = VerbosityConfig::from_verbose_level(3);
        assert!(c.debug_gte(DebugFlag::Transport, 1));
    }
}
