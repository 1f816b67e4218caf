//! `HSERR`-file diagnostics: appends timestamped lines to the path named by
//! the `HSERR` environment variable, a no-op if it is unset (grounded on
//! `log_error()` in `HSDISP.C`, which only opens its error file when the
//! corresponding environment/command-line path is configured).

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use time::OffsetDateTime;

/// Appends `message` to the file named by `HSERR`, prefixed with a local
/// timestamp. Silently does nothing if `HSERR` is unset or the file cannot
/// be opened — this is a best-effort diagnostic sink, not the primary error
/// path (spec §7: fatal errors are reported through [`crate::events`] and
/// the returned `CancelReason`, not this file).
pub fn log_error(message: &str) {
    let Ok(path) = std::env::var("HSERR") else {
        return;
    };
    append_line(Path::new(&path), message);
}

fn append_line(path: &Path, message: &str) {
    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let stamp = OffsetDateTime::now_local()
        .map(|t| t.to_string())
        .unwrap_or_else(|_| "unknown-time".to_string());
    let _ = writeln!(file, "[{stamp}] {message}");
}
