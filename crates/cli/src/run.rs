//! Wires a parsed [`Cli`] into a running [`Engine`]: builds the transport,
//! the filesystem-backed [`BatchCallbacks`], and drives the batch to
//! completion, translating its [`CancelReason`] into the process exit code.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use hslink_engine::descriptor::OutgoingFile;
use hslink_engine::{BatchCallbacks, CancelReason, Engine};
use tracing::{error, info};

use crate::args::Cli;

/// [`BatchCallbacks`] backed by real files on disk: one reader per
/// outgoing path, one writer per destination path, both opened lazily and
/// kept for the life of the transfer.
pub struct FsCallbacks {
    dest_dir: PathBuf,
    allow_overwrite: bool,
    readers: HashMap<PathBuf, File>,
    writers: HashMap<String, File>,
}

impl FsCallbacks {
    #[must_use]
    pub fn new(dest_dir: PathBuf, allow_overwrite: bool) -> Self {
        Self {
            dest_dir,
            allow_overwrite,
            readers: HashMap::new(),
            writers: HashMap::new(),
        }
    }

    fn destination_path(&self, remote_name: &str) -> PathBuf {
        self.dest_dir.join(remote_name)
    }
}

impl BatchCallbacks for FsCallbacks {
    fn destination_exists(&self, remote_name: &str) -> bool {
        self.destination_path(remote_name).exists()
    }

    fn existing_partial_size(&self, remote_name: &str) -> Option<u64> {
        std::fs::metadata(self.destination_path(remote_name)).ok().map(|meta| meta.len())
    }

    fn read_block(&mut self, file: &OutgoingFile, max_len: usize) -> io::Result<Vec<u8>> {
        if !self.readers.contains_key(&file.local_path) {
            self.readers.insert(file.local_path.clone(), File::open(&file.local_path)?);
        }
        let reader = self.readers.get_mut(&file.local_path).unwrap();
        reader.seek(SeekFrom::Start(file.send_offset))?;
        let mut buf = vec![0u8; max_len];
        let n = reader.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn write_block(&mut self, remote_name: &str, bytes: &[u8]) -> io::Result<()> {
        if !self.writers.contains_key(remote_name) {
            let path = self.destination_path(remote_name);
            let exists = path.exists();
            if exists && !self.allow_overwrite {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "destination exists"));
            }
            self.writers.insert(remote_name.to_string(), File::create(path)?);
        }
        let writer = self.writers.get_mut(remote_name).unwrap();
        writer.write_all(bytes)
    }

    fn delete_partial(&mut self, remote_name: &str) -> io::Result<()> {
        self.writers.remove(remote_name);
        let path = self.destination_path(remote_name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn set_mtime(&mut self, remote_name: &str, mtime: i64) -> io::Result<()> {
        self.writers.remove(remote_name);
        let path = self.destination_path(remote_name);
        let time = filetime::FileTime::from_unix_time(mtime, 0);
        filetime::set_file_mtime(&path, time)
    }
}

/// Stats every local path on the command line into an [`OutgoingFile`]
/// descriptor ready for the engine (spec §3). A path that cannot be statted
/// is logged and dropped from the queue; it never fails the whole batch
/// (spec §7).
pub fn build_outgoing(paths: &[PathBuf]) -> Vec<OutgoingFile> {
    paths
        .iter()
        .filter_map(|path| match std::fs::metadata(path) {
            Ok(meta) => {
                let remote_name = file_name_lossy(path);
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_secs() as i64);
                Some(OutgoingFile::new(path.clone(), remote_name, meta.len(), mtime))
            }
            Err(err) => {
                error!(path = %path.display(), %err, "failed to stat local file, dropping it from the batch");
                None
            }
        })
        .collect()
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Drives one batch transfer over `transport` and returns the terminal
/// [`CancelReason`], which becomes the process exit code.
pub async fn run_batch<T: hslink_transport::TransportAdapter>(
    cli: &Cli,
    transport: T,
) -> CancelReason {
    let options = match cli.to_engine_options() {
        Ok(options) => options,
        Err(message) => {
            error!(message, "bad command-line option");
            return CancelReason::BadOption;
        }
    };

    let outgoing = build_outgoing(&cli.files);

    let dest_dir = cli.upload_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let callbacks = FsCallbacks::new(dest_dir, options.allow_overwrite);
    let mut engine = Engine::new(transport, callbacks, options, outgoing);

    match engine.run().await {
        Ok(reason) => {
            info!(%reason, "batch finished");
            reason
        }
        Err(err) => {
            error!(%err, "batch aborted with an unrecoverable error");
            CancelReason::BadOption
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_outgoing_drops_unreadable_paths_and_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, b"hello").unwrap();
        let missing = dir.path().join("does-not-exist.txt");

        let outgoing = build_outgoing(&[good.clone(), missing]);

        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].local_path, good);
        assert_eq!(outgoing[0].size, 5);
    }
}
