//! Batch coordinator: the top-level state machine that stages a whole
//! transfer session from handshake through shutdown (spec §4.6).
//!
//! Grounded on `HSLINK.C`'s `main()`: `wait_for_ready()` →
//! (per-file `transmit_file()` / `finish_receive()`) → `terminate_link()` →
//! `exit(WS.cancel_link)`.

use rustc_hash::FxHashMap;

use crate::cancel::CancelReason;
use crate::descriptor::{IncomingFile, OutgoingFile};

/// The batch coordinator's top-level stage (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Link just opened; nothing has been negotiated yet.
    Init,
    /// Exchanging `READY` until both sides agree on alphabet/window/block size.
    ReadyHs,
    /// Streaming files in both directions.
    Transfer,
    /// All local files are done; waiting out whatever the peer still has in
    /// flight before sending `TERMINATE`.
    Drain,
    /// `TERMINATE` sent or received; tearing the transport down.
    Terminate,
    /// The batch coordinator has nothing left to do.
    Closed,
}

/// Owns every file descriptor and drives [`BatchState`] transitions. Holds
/// no transport or engine-options state directly; the caller (`engine.rs`)
/// supplies those and calls back in with events.
pub struct BatchCoordinator {
    pub state: BatchState,
    pub outgoing: Vec<OutgoingFile>,
    pub outgoing_cursor: usize,
    pub incoming: FxHashMap<String, IncomingFile>,
    pub files_sent: u32,
    pub files_received: u32,
    pub cancel_reason: CancelReason,
    /// Set once this side has sent its own `TERMINATE` announcing "no more
    /// files from me" (spec §4.6 point 5).
    pub announced_done: bool,
    /// Set once the peer's `TERMINATE` has been observed. Graceful shutdown
    /// requires both: otherwise a side with nothing to receive could send
    /// `TERMINATE` before the peer has even announced its first file.
    pub peer_terminate_received: bool,
}

impl BatchCoordinator {
    #[must_use]
    pub fn new(outgoing: Vec<OutgoingFile>) -> Self {
        Self {
            state: BatchState::Init,
            outgoing,
            outgoing_cursor: 0,
            incoming: FxHashMap::default(),
            files_sent: 0,
            files_received: 0,
            cancel_reason: CancelReason::None,
            announced_done: false,
            peer_terminate_received: false,
        }
    }

    /// Handshake has converged on a shared alphabet/window/block size:
    /// `Init` -> `ReadyHs` -> `Transfer`.
    pub fn enter_ready_hs(&mut self) {
        debug_assert_eq!(self.state, BatchState::Init);
        self.state = BatchState::ReadyHs;
    }

    pub fn enter_transfer(&mut self) {
        debug_assert_eq!(self.state, BatchState::ReadyHs);
        self.state = BatchState::Transfer;
    }

    /// The outgoing file at the cursor just finished (sent or skipped);
    /// advances the cursor and returns the next file to start, if any.
    pub fn advance_outgoing(&mut self) -> Option<&mut OutgoingFile> {
        self.files_sent += 1;
        self.outgoing_cursor += 1;
        self.outgoing.get_mut(self.outgoing_cursor)
    }

    #[must_use]
    pub fn current_outgoing(&mut self) -> Option<&mut OutgoingFile> {
        self.outgoing.get_mut(self.outgoing_cursor)
    }

    #[must_use]
    pub fn all_outgoing_done(&self) -> bool {
        self.outgoing_cursor >= self.outgoing.len()
    }

    pub fn begin_incoming(&mut self, remote_name: String, file: IncomingFile) {
        self.incoming.insert(remote_name, file);
    }

    pub fn finish_incoming(&mut self, remote_name: &str) {
        self.files_received += 1;
        self.incoming.remove(remote_name);
    }

    #[must_use]
    pub fn any_incoming_open(&self) -> bool {
        !self.incoming.is_empty()
    }

    /// `Transfer` -> `Drain`: every local file has been offered; still
    /// waiting on whatever the peer is sending. Idempotent, since the
    /// caller checks `all_outgoing_done()` on every pass through `Transfer`.
    pub fn enter_drain(&mut self) {
        if self.state == BatchState::Transfer {
            self.state = BatchState::Drain;
        }
    }

    /// Whether this side has offered every local file and should announce
    /// "no more files from me" by sending its own `TERMINATE` (spec §4.6
    /// point 5). Returns `true` at most once.
    pub fn should_announce_done(&mut self) -> bool {
        if self.announced_done || !self.all_outgoing_done() {
            return false;
        }
        self.announced_done = true;
        true
    }

    pub fn mark_peer_terminate_received(&mut self) {
        self.peer_terminate_received = true;
    }

    /// `Drain` ends once the peer has announced it has nothing more to send
    /// and every incoming file this side opened has reached a terminal
    /// state (spec §4.6 point 6).
    #[must_use]
    pub fn drain_complete(&self) -> bool {
        self.peer_terminate_received && !self.any_incoming_open()
    }

    /// Requests early termination (carrier loss, framing-error limit,
    /// six-`CAN` cancel from either side). Sticky: the first reason wins.
    pub fn request_terminate(&mut self, reason: CancelReason) {
        if self.cancel_reason == CancelReason::None {
            self.cancel_reason = reason;
        }
        self.state = BatchState::Terminate;
    }

    /// Normal end of `Drain`: both local and remote work are done.
    pub fn enter_terminate_clean(&mut self) {
        debug_assert_eq!(self.state, BatchState::Drain);
        self.state = BatchState::Terminate;
    }

    pub fn enter_closed(&mut self) {
        self.state = BatchState::Closed;
    }

    /// Finalizes `cancel_reason` once `Terminate` has run (spec §4.6 point 6,
    /// `HSLINK.C`'s post-loop `cancel_link` computation): a batch that never
    /// transferred anything and was never cancelled for a specific reason is
    /// `NoFiles`.
    pub fn finalize_cancel_reason(&mut self) -> CancelReason {
        if self.cancel_reason == CancelReason::None && self.files_sent == 0 && self.files_received == 0 {
            self.cancel_reason = CancelReason::NoFiles;
        }
        self.cancel_reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_in_order() {
        let mut b = BatchCoordinator::new(Vec::new());
        assert_eq!(b.state, BatchState::Init);
        b.enter_ready_hs();
        assert_eq!(b.state, BatchState::ReadyHs);
        b.enter_transfer();
        assert_eq!(b.state, BatchState::Transfer);
        b.enter_drain();
        assert_eq!(b.state, BatchState::Drain);
        b.enter_terminate_clean();
        assert_eq!(b.state, BatchState::Terminate);
        b.enter_closed();
        assert_eq!(b.state, BatchState::Closed);
    }

    #[test]
    fn no_files_transferred_yields_no_files_cancel_reason() {
        let mut b = BatchCoordinator::new(Vec::new());
        b.enter_ready_hs();
        b.enter_transfer();
        b.enter_drain();
        b.enter_terminate_clean();
        assert_eq!(b.finalize_cancel_reason(), CancelReason::NoFiles);
    }

    #[test]
    fn explicit_cancel_reason_wins_over_no_files() {
        let mut b = BatchCoordinator::new(Vec::new());
        b.request_terminate(CancelReason::CarrierLost);
        assert_eq!(b.finalize_cancel_reason(), CancelReason::CarrierLost);
    }

    #[test]
    fn first_cancel_reason_is_sticky() {
        let mut b = BatchCoordinator::new(Vec::new());
        b.request_terminate(CancelReason::Keyboard);
        b.request_terminate(CancelReason::Remote);
        assert_eq!(b.cancel_reason, CancelReason::Keyboard);
    }

    #[test]
    fn completing_a_transfer_is_not_no_files() {
        let mut b = BatchCoordinator::new(Vec::new());
        b.files_sent = 1;
        assert_eq!(b.finalize_cancel_reason(), CancelReason::None);
    }

    #[test]
    fn should_announce_done_fires_exactly_once() {
        let mut b = BatchCoordinator::new(Vec::new());
        assert!(b.all_outgoing_done());
        assert!(b.should_announce_done());
        assert!(!b.should_announce_done());
    }

    #[test]
    fn should_announce_done_waits_on_outstanding_outgoing_files() {
        let file = OutgoingFile::new(std::path::PathBuf::from("x"), "x".into(), 10, 0);
        let mut b = BatchCoordinator::new(vec![file]);
        assert!(!b.should_announce_done());
        b.advance_outgoing();
        assert!(b.should_announce_done());
    }

    #[test]
    fn drain_complete_requires_both_peer_terminate_and_no_open_incoming() {
        let mut b = BatchCoordinator::new(Vec::new());
        assert!(!b.drain_complete());

        b.begin_incoming("remote.bin".into(), IncomingFile::new(std::path::PathBuf::from("remote.bin"), 4, 0));
        b.mark_peer_terminate_received();
        assert!(!b.drain_complete(), "an open incoming file should still block drain");

        b.finish_incoming("remote.bin");
        assert!(b.drain_complete());
    }

    #[test]
    fn receive_only_side_cannot_drain_before_peer_announces_done() {
        // A side with nothing outgoing must not race ahead and call itself
        // done before the peer has even sent its first FILE_HEADER.
        let mut b = BatchCoordinator::new(Vec::new());
        assert!(b.should_announce_done());
        assert!(!b.drain_complete());
    }
}
