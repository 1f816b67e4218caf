//! End-to-end test: two [`Engine`] instances joined over a
//! [`LoopbackTransport`] pair, one sending a file the other receives,
//! exercising the full handshake/transfer/drain/terminate lifecycle
//! (spec §4.6, §4.7) rather than any single state machine in isolation.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use hslink_engine::config::EngineOptions;
use hslink_engine::descriptor::OutgoingFile;
use hslink_engine::{BatchCallbacks, CancelReason, Engine};
use hslink_transport::{LoopbackTransport, TransportAdapter};

/// In-memory [`BatchCallbacks`]: sources keyed by local path, writes keyed
/// by remote name and shared via `Arc<Mutex<_>>` so the test can inspect
/// what a moved-into-the-engine callback set received.
struct MemCallbacks {
    sources: HashMap<PathBuf, Vec<u8>>,
    preexisting: Vec<String>,
    written: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl BatchCallbacks for MemCallbacks {
    fn destination_exists(&self, remote_name: &str) -> bool {
        self.preexisting.iter().any(|n| n == remote_name)
    }

    fn existing_partial_size(&self, _remote_name: &str) -> Option<u64> {
        None
    }

    fn read_block(&mut self, file: &OutgoingFile, max_len: usize) -> io::Result<Vec<u8>> {
        let data = self.sources.get(&file.local_path).expect("unknown source path");
        let start = file.send_offset as usize;
        let end = (start + max_len).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn write_block(&mut self, remote_name: &str, bytes: &[u8]) -> io::Result<()> {
        self.written
            .lock()
            .unwrap()
            .entry(remote_name.to_string())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn delete_partial(&mut self, remote_name: &str) -> io::Result<()> {
        self.written.lock().unwrap().remove(remote_name);
        Ok(())
    }

    fn set_mtime(&mut self, _remote_name: &str, _mtime: i64) -> io::Result<()> {
        Ok(())
    }
}

/// Wraps a [`LoopbackTransport`] and flips one byte on the Nth `write()`
/// call, counting from 1. Since `LoopbackTransport::write` always accepts
/// a whole packet's wire bytes in one call, this targets one specific
/// outbound packet deterministically.
struct CorruptingTransport {
    inner: LoopbackTransport,
    writes_seen: u32,
    corrupt_at: u32,
}

impl TransportAdapter for CorruptingTransport {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.writes_seen += 1;
        if self.writes_seen == self.corrupt_at {
            self.inner.corrupt_next_write();
        }
        self.inner.write(bytes).await
    }

    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.try_read(buf)
    }

    async fn readable(&mut self) {
        self.inner.readable().await
    }

    fn pending_tx(&self) -> usize {
        self.inner.pending_tx()
    }

    fn pending_rx(&self) -> usize {
        self.inner.pending_rx()
    }

    fn carrier_lost(&mut self) -> bool {
        self.inner.carrier_lost()
    }

    fn cts_ok(&self) -> bool {
        self.inner.cts_ok()
    }

    fn assert_rts(&mut self, on: bool) {
        self.inner.assert_rts(on)
    }

    fn send_xoff(&mut self) {
        self.inner.send_xoff()
    }

    fn send_xon(&mut self) {
        self.inner.send_xon()
    }

    fn take_error_counters(&mut self) -> hslink_transport::ErrorCounters {
        self.inner.take_error_counters()
    }

    fn io_region_enter(&mut self) -> u32 {
        self.inner.io_region_enter()
    }

    fn io_region_exit(&mut self) -> u32 {
        self.inner.io_region_exit()
    }

    async fn close(&mut self) {
        self.inner.close().await
    }
}

#[tokio::test]
async fn corrupted_data_packet_is_nakked_and_recovered() {
    // Corrupt the 3rd packet A writes: #1 READY, #2 FILE_HEADER, #3 the
    // first DATA(seq=0). The receiver's framing error must turn into a NAK
    // that rewinds the sender, not a stalled transfer (spec §8 scenario 4).
    let payload: Vec<u8> = b"0123456789abcdef"
        .iter()
        .copied()
        .cycle()
        .take(2048)
        .collect();
    let local_path = PathBuf::from("corrupt-me.bin");

    let mut sources = HashMap::new();
    sources.insert(local_path.clone(), payload.clone());
    let outgoing = vec![OutgoingFile::new(
        local_path,
        "corrupt-me.bin".into(),
        payload.len() as u64,
        0,
    )];

    let mut options = EngineOptions::default();
    options.block_size = 64;
    options.max_wind = 3;

    let (transport_a, transport_b) = LoopbackTransport::pair();
    let transport_a = CorruptingTransport {
        inner: transport_a,
        writes_seen: 0,
        corrupt_at: 3,
    };

    let written_b = Arc::new(Mutex::new(HashMap::new()));
    let callbacks_a = MemCallbacks {
        sources,
        preexisting: Vec::new(),
        written: Arc::new(Mutex::new(HashMap::new())),
    };
    let callbacks_b = MemCallbacks {
        sources: HashMap::new(),
        preexisting: Vec::new(),
        written: Arc::clone(&written_b),
    };

    let mut engine_a = Engine::new(transport_a, callbacks_a, options, outgoing);
    let mut engine_b = Engine::new(transport_b, callbacks_b, options, Vec::new());

    let (result_a, result_b) = tokio::join!(engine_a.run(), engine_b.run());

    assert_eq!(result_a.unwrap(), CancelReason::None);
    assert_eq!(result_b.unwrap(), CancelReason::None);
    assert_eq!(written_b.lock().unwrap().get("corrupt-me.bin"), Some(&payload));
}

#[tokio::test]
async fn one_directional_transfer_completes_end_to_end() {
    let payload: Vec<u8> = b"the quick brown fox jumps over the lazy dog "
        .iter()
        .copied()
        .cycle()
        .take(4096)
        .collect();
    let local_path = PathBuf::from("fox.txt");

    let mut sources = HashMap::new();
    sources.insert(local_path.clone(), payload.clone());
    let outgoing = vec![OutgoingFile::new(
        local_path,
        "fox.txt".into(),
        payload.len() as u64,
        0,
    )];

    let mut options = EngineOptions::default();
    options.block_size = 97; // force many DATA packets, not one giant block
    options.max_wind = 3;

    let (transport_a, transport_b) = LoopbackTransport::pair();

    let written_b = Arc::new(Mutex::new(HashMap::new()));
    let callbacks_a = MemCallbacks {
        sources,
        preexisting: Vec::new(),
        written: Arc::new(Mutex::new(HashMap::new())),
    };
    let callbacks_b = MemCallbacks {
        sources: HashMap::new(),
        preexisting: Vec::new(),
        written: Arc::clone(&written_b),
    };

    let mut engine_a = Engine::new(transport_a, callbacks_a, options, outgoing);
    let mut engine_b = Engine::new(transport_b, callbacks_b, options, Vec::new());

    let (result_a, result_b) = tokio::join!(engine_a.run(), engine_b.run());

    assert_eq!(result_a.unwrap(), CancelReason::None);
    assert_eq!(result_b.unwrap(), CancelReason::None);

    let files = written_b.lock().unwrap();
    assert_eq!(files.get("fox.txt"), Some(&payload));
}

#[tokio::test]
async fn receive_only_side_does_not_terminate_before_transfer_starts() {
    // A sends one file; B has nothing outgoing at all. Before the two-way
    // "announce done"/"peer terminate received" handshake, B would satisfy
    // `all_outgoing_done()` on its very first pass and close out before A's
    // FILE_HEADER even arrived.
    let payload = vec![7u8; 512];
    let local_path = PathBuf::from("blob.bin");
    let mut sources = HashMap::new();
    sources.insert(local_path.clone(), payload.clone());
    let outgoing = vec![OutgoingFile::new(
        local_path,
        "blob.bin".into(),
        payload.len() as u64,
        0,
    )];

    let options = EngineOptions::default();
    let (transport_a, transport_b) = LoopbackTransport::pair();

    let written_b = Arc::new(Mutex::new(HashMap::new()));
    let callbacks_a = MemCallbacks {
        sources,
        preexisting: Vec::new(),
        written: Arc::new(Mutex::new(HashMap::new())),
    };
    let callbacks_b = MemCallbacks {
        sources: HashMap::new(),
        preexisting: Vec::new(),
        written: Arc::clone(&written_b),
    };

    let mut engine_a = Engine::new(transport_a, callbacks_a, options, outgoing);
    let mut engine_b = Engine::new(transport_b, callbacks_b, options, Vec::new());

    let (result_a, result_b) = tokio::join!(engine_a.run(), engine_b.run());

    assert_eq!(result_a.unwrap(), CancelReason::None);
    assert_eq!(result_b.unwrap(), CancelReason::None);
    assert_eq!(written_b.lock().unwrap().get("blob.bin"), Some(&payload));
}
