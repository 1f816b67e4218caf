use std::fmt;

/// The terminal cancellation reason, doubling as the process exit code
/// (spec §6 "Exit codes", §5 "Cancellation semantics: sticky and monotonic").
///
/// Const accessors, a stable `as_i32`, and `From` impls into
/// `std::process::ExitCode` rather than a bare integer return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum CancelReason {
    /// No cancellation occurred; the batch ran to completion.
    #[default]
    None = 0,
    /// A bad command-line option was supplied before the link opened.
    BadOption = 1,
    /// The requested COM speed could not be programmed.
    BadComSpeed = 2,
    /// Carrier was required and was lost.
    CarrierLost = 3,
    /// The framing-error count exceeded `MAX_FRAMING`.
    FramingErrors = 4,
    /// The local operator typed six consecutive `Ctrl-X`.
    Keyboard = 5,
    /// The remote peer sent six consecutive `CAN` bytes.
    Remote = 6,
    /// The batch had nothing to send and nothing was expected.
    NoFiles = 7,
}

impl CancelReason {
    /// The stable exit-code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// A short, stable, human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::None => "success",
            Self::BadOption => "bad command-line option",
            Self::BadComSpeed => "could not program the requested line speed",
            Self::CarrierLost => "carrier lost",
            Self::FramingErrors => "too many framing errors",
            Self::Keyboard => "cancelled from the keyboard",
            Self::Remote => "cancelled by the remote peer",
            Self::NoFiles => "no files were sent or received",
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::None)
    }

    /// Reconstructs a `CancelReason` from its stable integer value.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::BadOption),
            2 => Some(Self::BadComSpeed),
            3 => Some(Self::CarrierLost),
            4 => Some(Self::FramingErrors),
            5 => Some(Self::Keyboard),
            6 => Some(Self::Remote),
            7 => Some(Self::NoFiles),
            _ => None,
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<CancelReason> for i32 {
    fn from(value: CancelReason) -> Self {
        value.as_i32()
    }
}

impl From<CancelReason> for std::process::ExitCode {
    fn from(value: CancelReason) -> Self {
        Self::from(value.as_i32().clamp(0, i32::from(u8::MAX)) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_i32_roundtrips() {
        for reason in [
            CancelReason::None,
            CancelReason::BadOption,
            CancelReason::BadComSpeed,
            CancelReason::CarrierLost,
            CancelReason::FramingErrors,
            CancelReason::Keyboard,
            CancelReason::Remote,
            CancelReason::NoFiles,
        ] {
            assert_eq!(CancelReason::from_i32(reason.as_i32()), Some(reason));
        }
    }

    #[test]
    fn from_i32_returns_none_for_unknown() {
        assert_eq!(CancelReason::from_i32(99), None);
    }

    #[test]
    fn is_success_only_for_none() {
        assert!(CancelReason::None.is_success());
        assert!(!CancelReason::Keyboard.is_success());
    }

    #[test]
    fn display_shows_description() {
        assert_eq!(CancelReason::CarrierLost.to_string(), "carrier lost");
    }

    #[test]
    fn default_is_none() {
        assert_eq!(CancelReason::default(), CancelReason::None);
    }

    #[test]
    fn descriptions_are_not_empty() {
        for i in 0..=7 {
            let reason = CancelReason::from_i32(i).unwrap();
            assert!(!reason.description().is_empty());
        }
    }
}
