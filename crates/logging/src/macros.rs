//! `format!`-style convenience wrappers around [`crate::events::info_log`]
//! and [`crate::events::debug_log`].

/// `info_log!(flag, level, "sent {n} bytes")`.
#[macro_export]
macro_rules! info_log {
    ($flag:expr, $level:expr, $($arg:tt)*) => {
        $crate::info_log($flag, $level, format!($($arg)*))
    };
}

/// `debug_log!(flag, level, "entering slow handshake")`.
#[macro_export]
macro_rules! debug_log {
    ($flag:expr, $level:expr, $($arg:tt)*) => {
        $crate::debug_log($flag, $level, format!($($arg)*))
    };
}
