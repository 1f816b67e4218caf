//! `-@file` response-file expansion (spec §6): a config file is a sequence
//! of additional command-line tokens, one or more per line, `#`-comments
//! and blank lines ignored. Tokens parsed after the response file's
//! expansion point (including the `-@file` flag's own command-line
//! neighbors) win on conflict, since `clap` takes the last value for a
//! repeated single-valued flag.

use std::io;
use std::path::Path;

/// Re-tokenizes `raw_args` (as `std::env::args()` would yield them),
/// splicing in the contents of any `-@PATH` token's file in place.
///
/// # Errors
/// Returns an error if a named response file cannot be read.
pub fn expand_response_files(raw_args: &[String]) -> io::Result<Vec<String>> {
    let mut out = Vec::with_capacity(raw_args.len());
    for arg in raw_args {
        if let Some(path) = arg.strip_prefix("-@") {
            if path.is_empty() {
                out.push(arg.clone());
                continue;
            }
            out.extend(read_response_file(Path::new(path))?);
        } else {
            out.push(arg.clone());
        }
    }
    Ok(out)
}

fn read_response_file(path: &Path) -> io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_response_args_pass_through_unchanged() {
        let args = vec!["hslink".to_string(), "-W4".to_string()];
        assert_eq!(expand_response_files(&args).unwrap(), args);
    }

    #[test]
    fn response_file_tokens_are_spliced_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opts.cfg");
        std::fs::write(&path, "# comment\n-W8 -S2048\n\n-A\n").unwrap();
        let args = vec![
            "hslink".to_string(),
            format!("-@{}", path.display()),
            "-K".to_string(),
        ];
        let expanded = expand_response_files(&args).unwrap();
        assert_eq!(expanded, vec!["hslink", "-W8", "-S2048", "-A", "-K"]);
    }

    #[test]
    fn missing_response_file_is_an_error() {
        let args = vec!["hslink".to_string(), "-@/no/such/file".to_string()];
        assert!(expand_response_files(&args).is_err());
    }
}
