//! Receive-side state machine: one [`IncomingFile`] driven from
//! `ExpectingHeader` through `Done`/`Skipped`/`Aborted` (spec §4.5).

use hslink_protocol::packet::NakReason;
use hslink_protocol::Packet;

use crate::descriptor::{IncomingFile, IncomingState};

/// What the receive-side state machine wants the caller to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum RecvAction {
    /// Reply with this packet (an `ACK`, `NAK`, or `SKIP`).
    Reply(Packet),
    /// Append `bytes` to the sink at the current write offset.
    WriteBytes(Vec<u8>),
    /// Nothing to do.
    Idle,
    /// The file is finished; advance to the next.
    Advance,
}

/// Drives one incoming file against its `expected_seq()` cursor.
pub struct RecvSide<'a> {
    pub file: &'a mut IncomingFile,
    pub allow_overwrite: bool,
}

impl<'a> RecvSide<'a> {
    pub fn new(file: &'a mut IncomingFile, allow_overwrite: bool) -> Self {
        Self {
            file,
            allow_overwrite,
        }
    }

    /// Handles an inbound `FILE_HEADER`. `exists` reports whether
    /// `remote_name` already exists at the destination (spec §4.5 point 1:
    /// `NAK(Duplicate)` when it does and overwrite is disallowed).
    /// `resume_offset`, when `Some`, names an on-disk partial file shorter
    /// than the incoming size that resume negotiation should pick up from
    /// (spec §4.5 point 1's `ResumeVerify` path).
    pub fn on_file_header(&mut self, exists: bool, resume_offset: Option<u64>) -> RecvAction {
        debug_assert_eq!(self.file.state, IncomingState::ExpectingHeader);
        if exists && !self.allow_overwrite {
            self.file.state = IncomingState::Skipped;
            return RecvAction::Reply(Packet::Nak {
                seq: 0,
                reason: NakReason::Duplicate,
            });
        }
        if let Some(offset) = resume_offset {
            self.file.bytes_written = offset;
            self.file.state = IncomingState::Writing;
            return RecvAction::Reply(Packet::Nak {
                seq: 0,
                reason: NakReason::Resume(offset),
            });
        }
        self.file.state = IncomingState::Writing;
        RecvAction::Reply(Packet::Ack { seq: 0 })
    }

    /// Handles an inbound `DATA` packet (spec §4.5 point 2: accept only the
    /// expected seq, discard-and-reACK a duplicate re-send, NAK a gap with
    /// `Framing`, ACK contiguous writes).
    pub fn on_data(&mut self, seq: u16, payload: Vec<u8>) -> RecvAction {
        if self.file.state != IncomingState::Writing {
            return RecvAction::Idle;
        }
        let expected = self.file.expected_seq();
        let delta = (seq.wrapping_sub(expected)) as i16;
        if delta < 0 {
            // Already-written block resent (its ACK was likely lost): drop
            // the payload and re-ACK what we actually hold, so the sender's
            // window advances instead of retrying forever.
            return RecvAction::Reply(Packet::Ack {
                seq: self.file.highest_contiguous_seq.unwrap_or(seq),
            });
        }
        if delta > 0 {
            return RecvAction::Reply(Packet::Nak {
                seq: expected,
                reason: NakReason::Framing,
            });
        }
        self.file.highest_contiguous_seq = Some(seq);
        self.file.bytes_written += payload.len() as u64;
        RecvAction::Reply(Packet::Ack { seq })
    }

    /// Handles an inbound `EOF`: the file is complete once every byte
    /// (`size_expected`) has arrived contiguously (spec §4.5 point 4).
    pub fn on_eof(&mut self) -> RecvAction {
        if self.file.state != IncomingState::Writing {
            return RecvAction::Idle;
        }
        if self.file.bytes_written < self.file.size_expected {
            self.file.state = IncomingState::EofPending;
            let expected = self.file.expected_seq();
            return RecvAction::Reply(Packet::Nak {
                seq: expected,
                reason: NakReason::Resume(self.file.bytes_written),
            });
        }
        self.file.state = IncomingState::Done;
        RecvAction::Advance
    }

    /// The peer sent `SKIP`: abandon this file, keeping the partial bytes
    /// only if `keep_aborted` was set (handled by the caller via
    /// `partial_keep_flag`).
    pub fn on_skip(&mut self) -> RecvAction {
        self.file.state = IncomingState::Aborted;
        RecvAction::Advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file() -> IncomingFile {
        IncomingFile::new(PathBuf::from("x"), 4, 0)
    }

    #[test]
    fn duplicate_without_overwrite_is_nakked_and_skipped() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        let action = r.on_file_header(true, None);
        assert_eq!(
            action,
            RecvAction::Reply(Packet::Nak {
                seq: 0,
                reason: NakReason::Duplicate
            })
        );
        assert_eq!(f.state, IncomingState::Skipped);
    }

    #[test]
    fn resume_offset_seeds_bytes_written_and_replies_with_nak_resume() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        let action = r.on_file_header(false, Some(2));
        assert_eq!(
            action,
            RecvAction::Reply(Packet::Nak {
                seq: 0,
                reason: NakReason::Resume(2)
            })
        );
        assert_eq!(f.bytes_written, 2);
        assert_eq!(f.state, IncomingState::Writing);
    }

    #[test]
    fn contiguous_data_is_acked_and_advances_expected_seq() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        r.on_file_header(false, None);
        assert_eq!(
            r.on_data(0, vec![1, 2]),
            RecvAction::Reply(Packet::Ack { seq: 0 })
        );
        assert_eq!(f.expected_seq(), 1);
    }

    #[test]
    fn gap_is_nakked_with_expected_seq() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        r.on_file_header(false, None);
        assert_eq!(
            r.on_data(3, vec![1, 2]),
            RecvAction::Reply(Packet::Nak {
                seq: 0,
                reason: NakReason::Framing
            })
        );
    }

    #[test]
    fn duplicate_resend_is_acked_without_rewriting() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        r.on_file_header(false, None);
        r.on_data(0, vec![1, 2]);
        assert_eq!(f.bytes_written, 2);
        assert_eq!(
            r.on_data(0, vec![1, 2]),
            RecvAction::Reply(Packet::Ack { seq: 0 })
        );
        assert_eq!(f.bytes_written, 2);
        assert_eq!(f.expected_seq(), 1);
    }

    #[test]
    fn eof_completes_once_all_bytes_written() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        r.on_file_header(false, None);
        r.on_data(0, vec![1, 2, 3, 4]);
        assert_eq!(r.on_eof(), RecvAction::Advance);
        assert_eq!(f.state, IncomingState::Done);
    }

    #[test]
    fn eof_before_all_bytes_is_nakked() {
        let mut f = file();
        let mut r = RecvSide::new(&mut f, false);
        r.on_file_header(false, None);
        r.on_data(0, vec![1, 2]);
        assert_eq!(
            r.on_eof(),
            RecvAction::Reply(Packet::Nak {
                seq: 1,
                reason: NakReason::Resume(2)
            })
        );
        assert_eq!(f.state, IncomingState::EofPending);
    }
}
