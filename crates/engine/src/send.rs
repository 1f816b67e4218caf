//! Send-side state machine: one [`OutgoingFile`] driven from `Pending`
//! through `Done`/`Skipped` (spec §4.4).

use hslink_protocol::packet::NakReason;
use hslink_protocol::Packet;

use crate::config::EngineOptions;
use crate::descriptor::{OutgoingFile, OutgoingState};
use crate::window::SendWindow;

/// What the send-side state machine wants the caller to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum SendAction {
    /// Transmit this packet now.
    Emit(Packet),
    /// Nothing to send until more window room opens up or a file is read.
    Idle,
    /// This file is finished (delivered or skipped); advance to the next.
    Advance,
}

/// Drives one outgoing file's window: what to (re)send in response to
/// acknowledgements, and when the file is fully delivered.
pub struct SendSide<'a> {
    pub file: &'a mut OutgoingFile,
    pub window: &'a mut SendWindow,
    pub options: &'a EngineOptions,
}

impl<'a> SendSide<'a> {
    pub fn new(file: &'a mut OutgoingFile, window: &'a mut SendWindow, options: &'a EngineOptions) -> Self {
        Self {
            file,
            window,
            options,
        }
    }

    /// Begins the transfer: emits the `FILE_HEADER`.
    pub fn start(&mut self) -> SendAction {
        debug_assert_eq!(self.file.state, OutgoingState::Pending);
        self.file.state = OutgoingState::HeaderSent;
        SendAction::Emit(Packet::FileHeader {
            remote_name: self.file.remote_name.clone(),
            size: self.file.size,
            mtime: self.file.mtime,
            first_offset: self.file.send_offset,
        })
    }

    /// Called once a block has been read from disk at `self.file.send_offset`.
    /// Enqueues it in the window and returns the `DATA` packet to transmit,
    /// or `SendAction::Idle` if the window has no room.
    pub fn offer_block(&mut self, payload: Vec<u8>) -> SendAction {
        if !self.window.has_room() {
            return SendAction::Idle;
        }
        let seq = self.file.next_seq_to_send;
        if self.window.is_empty() {
            self.file.oldest_unacked_since = Some(std::time::Instant::now());
        }
        self.window.push(seq, payload.clone(), self.file.send_offset);
        self.file.next_seq_to_send = seq.wrapping_add(1);
        self.file.send_offset += payload.len() as u64;
        self.file.window_used = self.window.len();
        self.file.state = OutgoingState::Streaming;
        SendAction::Emit(Packet::Data { seq, payload })
    }

    /// Checks whether the oldest unacknowledged block has outlived
    /// `window_round_timeout_ms` and, if so, synthesizes the same `NAK` a
    /// timed-out round is treated as (spec §4.4 point 5).
    pub fn check_window_timeout(&mut self) -> Option<SendAction> {
        let since = self.file.oldest_unacked_since?;
        if since.elapsed().as_millis() as u64 >= self.options.window_round_timeout_ms() {
            let seq = self.file.oldest_unacked_seq;
            return Some(self.on_reply(&Packet::Nak {
                seq,
                reason: NakReason::Framing,
            }));
        }
        None
    }

    /// The local file has been fully read: emit `EOF` once the window drains.
    pub fn offer_eof(&mut self) -> SendAction {
        if !self.window.is_empty() {
            return SendAction::Idle;
        }
        self.file.state = OutgoingState::EofSent;
        SendAction::Emit(Packet::Eof)
    }

    /// Handles an inbound `ACK`/`NAK`/`RESUME` addressed to this file
    /// (spec §4.4 points 3-4).
    pub fn on_reply(&mut self, packet: &Packet) -> SendAction {
        match packet {
            Packet::Ack { seq } => {
                // Once `EOF` has been sent the window is already drained; the
                // next `ACK` the peer sends acknowledges the `EOF` itself and
                // closes the file out, regardless of which seq it names.
                if self.file.state == OutgoingState::EofSent {
                    self.file.state = OutgoingState::Done;
                    return SendAction::Advance;
                }
                if self.window.accepts_ack(*seq) {
                    self.window.retire_cumulative(*seq);
                    self.file.oldest_unacked_seq = self.window.oldest_seq().unwrap_or(*seq);
                    self.file.window_used = self.window.len();
                    self.file.last_nak_seq = None;
                    self.file.last_nak_count = 0;
                    self.file.oldest_unacked_since = if self.window.is_empty() {
                        None
                    } else {
                        Some(std::time::Instant::now())
                    };
                }
                SendAction::Idle
            }
            Packet::Nak { seq, reason } => {
                let repeated = self.file.last_nak_seq == Some(*seq);
                self.file.last_nak_seq = Some(*seq);
                self.file.last_nak_count = if repeated { self.file.last_nak_count + 1 } else { 1 };

                // Captured before truncation: the rewind target is the byte
                // offset the NAKed seq itself started at (spec §4.4 point 4),
                // not wherever `oldest_unacked_seq` currently points.
                let rewind_offset = self.window.offset_of(*seq);
                self.window.truncate_all();
                self.file.window_used = 0;
                self.file.oldest_unacked_since = None;
                match reason {
                    NakReason::Resume(offset) => {
                        self.file.send_offset = *offset;
                        self.file.next_seq_to_send = *seq;
                        self.file.oldest_unacked_seq = *seq;
                    }
                    NakReason::Duplicate => {
                        self.file.state = OutgoingState::Skipped;
                        return SendAction::Advance;
                    }
                    NakReason::Framing => {
                        self.file.send_offset = rewind_offset.unwrap_or(self.file.send_offset);
                        self.file.next_seq_to_send = *seq;
                        self.file.oldest_unacked_seq = *seq;
                    }
                }

                // A second NAK for the same seq, still within this window
                // round, means a retransmit already failed to land: escalate
                // instead of silently retrying forever.
                if self.file.last_nak_count >= 2 {
                    return SendAction::Emit(Packet::ExtNak {
                        diagnostic: format!("seq {seq} NAKed {} times in a row ({reason:?})", self.file.last_nak_count),
                    });
                }
                SendAction::Idle
            }
            Packet::Resume { offset } => {
                self.window.truncate_all();
                self.file.window_used = 0;
                self.file.oldest_unacked_since = None;
                self.file.send_offset = *offset;
                self.file.next_seq_to_send = self.file.oldest_unacked_seq;
                SendAction::Idle
            }
            _ => SendAction::Idle,
        }
    }

    /// `-Wn = 0`: no acknowledgements are ever expected, so the file is done
    /// the instant local reading hits EOF (spec §9's `MaxWind = 0` resolution).
    pub fn finish_without_acks(&mut self) -> SendAction {
        debug_assert!(self.options.acks_disabled());
        self.file.state = OutgoingState::Done;
        SendAction::Advance
    }
}
