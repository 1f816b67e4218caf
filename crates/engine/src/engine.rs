//! Top-level driver: wires the dispatcher, the send/receive state machines,
//! and the batch coordinator around one [`TransportAdapter`] (spec §4, §5).
//!
//! Cooperative-scheduler idle loop redesigned as a single async task that
//! suspends at every wait point (`idle_tick`, `adapter.readable()`) rather
//! than polling a DOS-era interrupt ring (Design Notes §9).

use hslink_protocol::packet::NakReason;
use hslink_protocol::{framing, Packet};
use hslink_transport::{SlowHandshakeGuard, TransportAdapter};
use tracing::{debug, info, warn};

use crate::batch::{BatchCoordinator, BatchState};
use crate::cancel::CancelReason;
use crate::config::EngineOptions;
use crate::descriptor::{IncomingFile, OutgoingFile};
use crate::dispatch::{DispatchEvent, Dispatcher, Routed};
use crate::error::EngineError;
use crate::idle::{idle_tick, IdleOutcome};
use crate::recv::{RecvAction, RecvSide};
use crate::send::{SendAction, SendSide};
use crate::window::SendWindow;

/// Caller-supplied hooks the engine cannot provide on its own: local
/// filesystem checks the protocol state machine is deliberately kept clean
/// of (spec §4.5 point 1: does `remote_name` already exist?).
pub trait BatchCallbacks: Send {
    fn destination_exists(&self, remote_name: &str) -> bool;
    /// Size of an on-disk partial file shorter than the incoming transfer,
    /// or `None` if no such partial exists (spec §4.5 point 1's
    /// `ResumeVerify` path).
    fn existing_partial_size(&self, remote_name: &str) -> Option<u64>;
    fn read_block(&mut self, file: &OutgoingFile, max_len: usize) -> std::io::Result<Vec<u8>>;
    fn write_block(&mut self, remote_name: &str, bytes: &[u8]) -> std::io::Result<()>;
    /// Deletes a partial file abandoned by `SKIP` (spec §4.5: `-K` unset).
    fn delete_partial(&mut self, remote_name: &str) -> std::io::Result<()>;
    /// Restores the remote file's modification time after a completed
    /// transfer (`-T`, spec §6).
    fn set_mtime(&mut self, remote_name: &str, mtime: i64) -> std::io::Result<()>;
}

/// Drives one full batch session over a concrete transport.
pub struct Engine<T: TransportAdapter, C: BatchCallbacks> {
    adapter: T,
    callbacks: C,
    options: EngineOptions,
    coordinator: BatchCoordinator,
    dispatcher: Dispatcher,
    send_window: SendWindow,
    active_incoming: Option<String>,
    read_buf: [u8; 4096],
}

impl<T: TransportAdapter, C: BatchCallbacks> Engine<T, C> {
    #[must_use]
    pub fn new(adapter: T, callbacks: C, options: EngineOptions, outgoing: Vec<OutgoingFile>) -> Self {
        let send_window = SendWindow::new(options.max_wind);
        Self {
            adapter,
            callbacks,
            options,
            coordinator: BatchCoordinator::new(outgoing),
            dispatcher: Dispatcher::new(),
            send_window,
            active_incoming: None,
            read_buf: [0u8; 4096],
        }
    }

    /// Runs the batch to completion, returning the cancellation reason that
    /// should become the process exit code (spec §6 "Exit codes").
    pub async fn run(&mut self) -> Result<CancelReason, EngineError> {
        self.handshake().await?;

        loop {
            match self.coordinator.state {
                BatchState::Transfer => {
                    self.drive_current_outgoing().await?;
                    self.pump_incoming().await?;
                    if self.coordinator.should_announce_done() {
                        self.send_packet(&Packet::Terminate).await?;
                        self.coordinator.enter_drain();
                    }
                }
                BatchState::Drain => {
                    self.pump_incoming().await?;
                    if self.coordinator.drain_complete() {
                        self.coordinator.enter_terminate_clean();
                    }
                }
                BatchState::Terminate => {
                    self.adapter.close().await;
                    self.coordinator.enter_closed();
                }
                BatchState::Closed => break,
                BatchState::Init | BatchState::ReadyHs => unreachable!("handshake() must leave Transfer"),
            }

            if let Err(err) = self.idle_pass().await {
                match err.cancel_reason() {
                    Some(reason) => self.coordinator.request_terminate(reason),
                    None => return Err(err),
                }
            }
        }

        Ok(self.coordinator.finalize_cancel_reason())
    }

    async fn idle_pass(&mut self) -> Result<(), EngineError> {
        match idle_tick(&mut self.adapter, self.options.require_carrier).await? {
            IdleOutcome::Continue => Ok(()),
            IdleOutcome::EnableSlowHandshake => {
                warn!("overrun count exceeded threshold, entering slow handshake");
                let _guard = SlowHandshakeGuard::enter(&mut self.adapter);
                Ok(())
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.coordinator.enter_ready_hs();
        self.send_packet(&Packet::Ready {
            alphabet: self.options.alphabet,
            max_wind: self.options.max_wind,
            block_size: self.options.block_size,
            flow: self.options.flow,
        })
        .await?;

        while self.coordinator.state == BatchState::ReadyHs {
            self.pump_incoming().await?;
            self.idle_pass().await?;
        }
        Ok(())
    }

    async fn drive_current_outgoing(&mut self) -> Result<(), EngineError> {
        let Some(file) = self.coordinator.current_outgoing() else {
            return Ok(());
        };
        let mut side = SendSide::new(file, &mut self.send_window, &self.options);

        if let Some(timeout_action) = side.check_window_timeout() {
            warn!("window round timed out waiting for an ACK, treating as NAK");
            match timeout_action {
                SendAction::Emit(packet) => self.send_packet(&packet).await?,
                SendAction::Idle => {}
                SendAction::Advance => {
                    info!("finished sending file, advancing to next");
                    self.coordinator.advance_outgoing();
                    return Ok(());
                }
            }
        }

        let Some(file) = self.coordinator.current_outgoing() else {
            return Ok(());
        };
        let mut side = SendSide::new(file, &mut self.send_window, &self.options);
        let action = match side.file.state {
            crate::descriptor::OutgoingState::Pending => side.start(),
            crate::descriptor::OutgoingState::HeaderSent
            | crate::descriptor::OutgoingState::Streaming => {
                if side.file.send_offset < side.file.size {
                    let block_size = self.options.block_size as usize;
                    let remaining = (side.file.size - side.file.send_offset) as usize;
                    match self.callbacks.read_block(side.file, block_size.min(remaining)) {
                        Ok(payload) => side.offer_block(payload),
                        Err(source) => {
                            // A local read failure drops just this file from the
                            // outgoing queue; it never aborts the batch (spec §7).
                            warn!(path = %side.file.local_path.display(), %source, "failed to read local file, skipping it");
                            side.file.state = crate::descriptor::OutgoingState::Skipped;
                            SendAction::Advance
                        }
                    }
                } else {
                    side.offer_eof()
                }
            }
            crate::descriptor::OutgoingState::EofSent => SendAction::Idle,
            crate::descriptor::OutgoingState::Done | crate::descriptor::OutgoingState::Skipped => {
                SendAction::Advance
            }
        };

        match action {
            SendAction::Emit(packet) => self.send_packet(&packet).await?,
            SendAction::Idle => {}
            SendAction::Advance => {
                info!("finished sending file, advancing to next");
                self.coordinator.advance_outgoing();
            }
        }
        Ok(())
    }

    async fn pump_incoming(&mut self) -> Result<(), EngineError> {
        let n = self.adapter.try_read(&mut self.read_buf)?;
        if n == 0 {
            return Ok(());
        }
        let events = self.dispatcher.push_bytes(&self.read_buf[..n]);
        for event in events {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: DispatchEvent) -> Result<(), EngineError> {
        match event {
            DispatchEvent::RemoteCancel => {
                warn!("remote sent six consecutive CAN bytes, cancelling");
                self.coordinator.request_terminate(CancelReason::Remote);
            }
            DispatchEvent::FramingError(err) => {
                debug!(%err, "framing error on inbound packet");
                // A corrupted frame could have been anything; reply as if it
                // were a bad DATA block so the sender rewinds and retries
                // (spec §4.2: "the caller replies with a NAK carrying the
                // last successfully-received seq").
                if let Some(name) = self.active_incoming.clone() {
                    if let Some(incoming) = self.coordinator.incoming.get(&name) {
                        let seq = incoming.expected_seq();
                        self.send_packet(&Packet::Nak {
                            seq,
                            reason: NakReason::Framing,
                        })
                        .await?;
                    }
                }
            }
            DispatchEvent::Packet(Routed::ForSender(packet)) => {
                let Some(file) = self.coordinator.current_outgoing() else {
                    return Ok(());
                };
                let mut side = SendSide::new(file, &mut self.send_window, &self.options);
                match side.on_reply(&packet) {
                    SendAction::Advance => {
                        self.coordinator.advance_outgoing();
                    }
                    SendAction::Emit(reply) => self.send_packet(&reply).await?,
                    SendAction::Idle => {}
                }
            }
            DispatchEvent::Packet(Routed::ForReceiver(packet)) => {
                self.handle_receiver_packet(packet).await?;
            }
            DispatchEvent::Packet(Routed::Control(packet)) => match packet {
                Packet::Ready { .. } => {
                    if self.coordinator.state == BatchState::ReadyHs {
                        self.coordinator.enter_transfer();
                    }
                }
                Packet::Terminate => {
                    debug!("peer announced no more files");
                    self.coordinator.mark_peer_terminate_received();
                }
                Packet::ExtNak { diagnostic } => {
                    warn!(diagnostic, "remote reported an extended NAK diagnostic");
                }
                Packet::Chat { text } => {
                    info!(text, "chat message from remote");
                }
                _ => {}
            },
        }
        Ok(())
    }

    async fn handle_receiver_packet(&mut self, packet: Packet) -> Result<(), EngineError> {
        match packet {
            Packet::FileHeader {
                remote_name,
                size,
                mtime,
                first_offset: _,
            } => {
                let exists = self.callbacks.destination_exists(&remote_name);
                let resume_offset = if !exists && self.options.resume_verify {
                    self.callbacks
                        .existing_partial_size(&remote_name)
                        .filter(|&partial| partial < size)
                } else {
                    None
                };
                let sink_path = std::path::PathBuf::from(&remote_name);
                let mut incoming = IncomingFile::new(sink_path, size, mtime);
                let mut recv = RecvSide::new(&mut incoming, self.options.allow_overwrite);
                let action = recv.on_file_header(exists, resume_offset);
                self.active_incoming = Some(remote_name.clone());
                self.coordinator.begin_incoming(remote_name, incoming);
                if let RecvAction::Reply(reply) = action {
                    self.send_packet(&reply).await?;
                }
            }
            Packet::Data { seq, payload } => {
                let Some(name) = self.active_incoming.clone() else {
                    return Ok(());
                };
                let Some(incoming) = self.coordinator.incoming.get_mut(&name) else {
                    return Ok(());
                };
                let mut recv = RecvSide::new(incoming, self.options.allow_overwrite);
                match recv.on_data(seq, payload.clone()) {
                    RecvAction::Reply(reply) => {
                        if matches!(reply, Packet::Ack { .. }) {
                            if let Err(source) = self.callbacks.write_block(&name, &payload) {
                                // A local write failure drops just this incoming
                                // file; it never aborts the batch (spec §7).
                                warn!(remote_name = %name, %source, "failed to write local file, aborting it");
                                self.coordinator.finish_incoming(&name);
                                self.active_incoming = None;
                                return Ok(());
                            }
                        }
                        self.send_packet(&reply).await?;
                    }
                    RecvAction::Idle | RecvAction::WriteBytes(_) | RecvAction::Advance => {}
                }
            }
            Packet::Eof => {
                let Some(name) = self.active_incoming.clone() else {
                    return Ok(());
                };
                let Some(incoming) = self.coordinator.incoming.get_mut(&name) else {
                    return Ok(());
                };
                let mut recv = RecvSide::new(incoming, self.options.allow_overwrite);
                let action = recv.on_eof();
                match action {
                    RecvAction::Advance => {
                        // The sender is waiting in `EofSent` for any ACK to retire its
                        // window; without one it never reaches `Done` (spec §4.5 point 5).
                        let ack_seq = self.coordinator.incoming[&name].expected_seq();
                        let file_mtime = self.coordinator.incoming[&name].mtime;
                        self.coordinator.finish_incoming(&name);
                        self.active_incoming = None;
                        if self.options.restore_mtime {
                            if let Err(source) = self.callbacks.set_mtime(&name, file_mtime) {
                                warn!(remote_name = %name, %source, "failed to restore mtime");
                            }
                        }
                        self.send_packet(&Packet::Ack { seq: ack_seq }).await?;
                    }
                    RecvAction::Reply(reply) => self.send_packet(&reply).await?,
                    RecvAction::Idle | RecvAction::WriteBytes(_) => {}
                }
            }
            Packet::Skip => {
                if let Some(name) = self.active_incoming.take() {
                    self.coordinator.finish_incoming(&name);
                    if !self.options.keep_aborted {
                        if let Err(source) = self.callbacks.delete_partial(&name) {
                            warn!(remote_name = %name, %source, "failed to delete partial file");
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<(), EngineError> {
        let wire = framing::encode(packet, self.options.alphabet);
        let mut written = 0;
        while written < wire.len() {
            written += self.adapter.write(&wire[written..]).await?;
            if written < wire.len() {
                self.adapter.readable().await;
            }
        }
        Ok(())
    }
}

/// `NAK`-reason constructor used by callers building resume requests
/// against [`Engine`] (spec §4.5 point 5).
#[must_use]
pub fn resume_nak(seq: u16, offset: u64) -> Packet {
    Packet::Nak {
        seq,
        reason: NakReason::Resume(offset),
    }
}

