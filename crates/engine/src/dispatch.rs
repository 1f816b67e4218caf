//! Packet dispatch: turns a raw inbound byte stream into routed, decoded
//! packets, and watches for the six-consecutive-`CAN` remote-cancel signal
//! that rides outside the framing codec entirely (spec §4.3).

use hslink_protocol::alphabet::{CANCEL_COUNT, CAN};
use hslink_protocol::framing::FrameDecoder;
use hslink_protocol::{FramingError, Packet};

/// Which state machine a decoded packet belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Acknowledges or rejects something this side sent: routes to `send`.
    ForSender(Packet),
    /// Carries data or control for something the peer is sending us: routes
    /// to `recv`.
    ForReceiver(Packet),
    /// Session-scoped control, handled by the batch coordinator directly.
    Control(Packet),
}

fn classify(packet: Packet) -> Routed {
    match packet {
        Packet::Ack { .. } | Packet::Nak { .. } | Packet::Resume { .. } => Routed::ForSender(packet),
        Packet::FileHeader { .. } | Packet::Data { .. } | Packet::Eof | Packet::Skip => {
            Routed::ForReceiver(packet)
        }
        Packet::Ready { .. } | Packet::Terminate | Packet::ExtNak { .. } | Packet::Chat { .. } => {
            Routed::Control(packet)
        }
    }
}

/// Incremental dispatcher: feed raw bytes in, get routed packets (or
/// framing errors) and a remote-cancel signal out.
#[derive(Debug, Default)]
pub struct Dispatcher {
    decoder: FrameDecoder,
    can_run: u32,
}

/// One unit of work produced by feeding bytes to the [`Dispatcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Packet(Routed),
    FramingError(FramingError),
    /// Six consecutive `CAN` bytes: the remote peer is cancelling the link
    /// (spec §4.3, §5 "Cancellation semantics").
    RemoteCancel,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw byte, producing zero or more dispatch events.
    pub fn push_byte(&mut self, byte: u8) -> Vec<DispatchEvent> {
        if byte == CAN {
            self.can_run += 1;
            if self.can_run >= CANCEL_COUNT {
                self.can_run = 0;
                return vec![DispatchEvent::RemoteCancel];
            }
            return Vec::new();
        }
        self.can_run = 0;

        match self.decoder.push_byte(byte) {
            None => Vec::new(),
            Some(Ok(packet)) => vec![DispatchEvent::Packet(classify(packet))],
            Some(Err(err)) => vec![DispatchEvent::FramingError(err)],
        }
    }

    /// Feeds a whole slice of raw bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<DispatchEvent> {
        bytes.iter().flat_map(|&b| self.push_byte(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hslink_protocol::alphabet::Alphabet;
    use hslink_protocol::framing::encode;

    #[test]
    fn six_consecutive_can_bytes_trigger_remote_cancel() {
        let mut d = Dispatcher::new();
        let mut events = Vec::new();
        for _ in 0..6 {
            events.extend(d.push_byte(CAN));
        }
        assert_eq!(events, vec![DispatchEvent::RemoteCancel]);
    }

    #[test]
    fn five_can_bytes_then_other_byte_does_not_cancel() {
        let mut d = Dispatcher::new();
        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(d.push_byte(CAN));
        }
        events.extend(d.push_byte(0x41));
        assert!(events.is_empty());
    }

    #[test]
    fn ack_routes_to_sender() {
        let packet = Packet::Ack { seq: 3 };
        let wire = encode(&packet, Alphabet::Classic);
        let mut d = Dispatcher::new();
        let events = d.push_bytes(&wire);
        assert_eq!(
            events,
            vec![DispatchEvent::Packet(Routed::ForSender(packet))]
        );
    }

    #[test]
    fn data_routes_to_receiver() {
        let packet = Packet::Data {
            seq: 1,
            payload: vec![9, 9],
        };
        let wire = encode(&packet, Alphabet::Classic);
        let mut d = Dispatcher::new();
        let events = d.push_bytes(&wire);
        assert_eq!(
            events,
            vec![DispatchEvent::Packet(Routed::ForReceiver(packet))]
        );
    }

    #[test]
    fn terminate_is_control() {
        let packet = Packet::Terminate;
        let wire = encode(&packet, Alphabet::Classic);
        let mut d = Dispatcher::new();
        let events = d.push_bytes(&wire);
        assert_eq!(
            events,
            vec![DispatchEvent::Packet(Routed::Control(packet))]
        );
    }
}
