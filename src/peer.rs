//! One endpoint of a bidirectional connection.

use crate::{
    byte_stream::{ByteStream, Reader, Writer},
    config::{ConfigError, TcpConfig},
    logging::segment_event,
    message::{ReceiverMessage, SenderMessage, TcpSegment},
    sender::State,
    Receiver, Sender,
};
use tracing::{debug, warn};

/// A [`Sender`] for the outbound stream and a [`Receiver`] for the inbound
/// stream, sharing every segment they put on the wire.
#[derive(Debug, Clone)]
pub struct TcpPeer {
    config: TcpConfig,
    sender: Sender,
    receiver: Receiver,
    /// A segment that occupied sequence space arrived and is owed an
    /// acknowledgment
    need_send: bool,
    /// Cleared when the inbound stream ends before our FIN has gone out.
    /// The remote side then closed first and will not retransmit its FIN.
    linger_after_streams_finish: bool,
    ms_since_last_segment: u64,
}

impl TcpPeer {
    pub fn new(config: TcpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let isn = config.isn_or_random();
        debug!(%isn, "Creating TCP peer");
        let sender = Sender::new(
            ByteStream::new(config.send_capacity),
            isn,
            config.initial_rto_ms,
        )
        .with_max_payload_size(config.max_payload_size);
        let receiver = Receiver::new(ByteStream::new(config.recv_capacity));
        Ok(Self {
            config,
            sender,
            receiver,
            need_send: false,
            linger_after_streams_finish: true,
            ms_since_last_segment: 0,
        })
    }

    /// Sends whatever the outbound window allows, plus an acknowledgment if
    /// one is owed and nothing else carried it.
    pub fn push(&mut self, mut transmit: impl FnMut(TcpSegment)) {
        let ack = self.receiver.send();
        let mut sent = false;
        self.sender.push(|message| {
            emit(message.clone(), ack, &mut transmit);
            sent = true;
        });
        if self.need_send && !sent {
            emit(self.sender.make_empty_message(), ack, &mut transmit);
        }
        self.need_send = false;
    }

    /// Processes one segment from the remote peer.
    pub fn receive(&mut self, segment: TcpSegment, transmit: impl FnMut(TcpSegment)) {
        if !self.active() {
            return;
        }
        segment_event("receive", &segment);
        self.ms_since_last_segment = 0;

        if segment.is_reset() {
            warn!("Connection reset by peer");
            self.set_error();
            return;
        }

        self.need_send |= segment.sender.sequence_length() > 0;
        self.receiver.receive(segment.sender);
        self.sender.receive(&segment.receiver);

        if self.receiver.stream().is_closed() && self.sender.state() != State::FinSent {
            self.linger_after_streams_finish = false;
        }

        self.push(transmit);
    }

    /// Advances time by `ms_since_last_tick` milliseconds. Retransmits if
    /// the sender's timer expires, and aborts the connection once the
    /// retransmission limit is exceeded.
    pub fn tick(&mut self, ms_since_last_tick: u64, mut transmit: impl FnMut(TcpSegment)) {
        if self.has_error() {
            return;
        }
        self.ms_since_last_segment = self.ms_since_last_segment.saturating_add(ms_since_last_tick);

        let ack = self.receiver.send();
        self.sender
            .tick(ms_since_last_tick, |message| emit(message.clone(), ack, &mut transmit));

        if self.sender.consecutive_retransmissions() > self.config.max_retx_attempts {
            warn!(
                attempts = self.sender.consecutive_retransmissions(),
                "Too many retransmissions, aborting connection"
            );
            self.set_error();
            emit(self.sender.make_empty_message(), self.receiver.send(), &mut transmit);
        }
    }

    /// Whether the connection is still alive. A connection ends on any
    /// error, or when both streams are finished and acknowledged and any
    /// lingering period has passed.
    pub fn active(&self) -> bool {
        if self.has_error() {
            return false;
        }
        let streams_finished = self.receiver.stream().is_closed() && self.sender.is_finished();
        if !streams_finished {
            return true;
        }
        self.linger_after_streams_finish
            && self.ms_since_last_segment < 10 * self.config.initial_rto_ms
    }

    fn has_error(&self) -> bool {
        self.sender.stream().has_error() || self.receiver.stream().has_error()
    }

    fn set_error(&mut self) {
        self.sender.writer().set_error();
        self.receiver.reader().set_error();
    }

    /// The handle the application writes outbound bytes through.
    pub fn outbound_writer(&mut self) -> Writer<'_> {
        self.sender.writer()
    }

    /// The handle the application reads inbound bytes through.
    pub fn inbound_reader(&mut self) -> Reader<'_> {
        self.receiver.reader()
    }

    pub fn outbound_stream(&self) -> &ByteStream {
        self.sender.stream()
    }

    pub fn inbound_stream(&self) -> &ByteStream {
        self.receiver.stream()
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }
}

/// Merges a sender message with the current acknowledgment and hands the
/// segment to the network.
fn emit(sender: SenderMessage, receiver: ReceiverMessage, transmit: &mut impl FnMut(TcpSegment)) {
    let segment = TcpSegment::new(sender, receiver);
    segment_event("send", &segment);
    transmit(segment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Wrap32;

    const RTO: u64 = 100;

    fn peer(isn: u32) -> TcpPeer {
        TcpPeer::new(TcpConfig {
            initial_rto_ms: RTO,
            isn: Some(Wrap32::new(isn)),
            ..Default::default()
        })
        .unwrap()
    }

    /// Delivers segments back and forth without loss until both sides are
    /// quiet.
    fn settle(a: &mut TcpPeer, b: &mut TcpPeer, mut to_b: Vec<TcpSegment>) {
        let mut to_a = Vec::new();
        while !to_a.is_empty() || !to_b.is_empty() {
            for segment in std::mem::take(&mut to_b) {
                b.receive(segment, |s| to_a.push(s));
            }
            for segment in std::mem::take(&mut to_a) {
                a.receive(segment, |s| to_b.push(s));
            }
        }
    }

    fn push(peer: &mut TcpPeer) -> Vec<TcpSegment> {
        let mut out = Vec::new();
        peer.push(|s| out.push(s));
        out
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TcpConfig {
            max_payload_size: 0,
            ..Default::default()
        };
        assert_eq!(
            TcpPeer::new(config).unwrap_err(),
            ConfigError::ZeroPayloadSize
        );
    }

    #[test]
    fn handshake_and_transfer() {
        let mut a = peer(1);
        let mut b = peer(0xffff_fff0);

        let syn = push(&mut a);
        assert_eq!(syn.len(), 1);
        assert!(syn[0].sender.syn);
        assert_eq!(syn[0].receiver.ackno, None);
        settle(&mut a, &mut b, syn);

        assert_eq!(a.sender().state(), State::Established);
        assert_eq!(b.sender().state(), State::Established);

        a.outbound_writer().push("hello");
        let data = push(&mut a);
        settle(&mut a, &mut b, data);
        assert_eq!(b.inbound_reader().read_to_end(), b"hello");

        b.outbound_writer().push("world");
        let data = push(&mut b);
        settle(&mut b, &mut a, data);
        assert_eq!(a.inbound_reader().read_to_end(), b"world");
        assert_eq!(a.sender().sequence_numbers_in_flight(), 0);
        assert_eq!(b.sender().sequence_numbers_in_flight(), 0);
    }

    #[test]
    fn side_that_closes_first_lingers() {
        let mut a = peer(1000);
        let mut b = peer(2000);
        let syn = push(&mut a);
        settle(&mut a, &mut b, syn);

        a.outbound_writer().close();
        let fin = push(&mut a);
        settle(&mut a, &mut b, fin);
        assert!(b.inbound_stream().is_closed());

        b.outbound_writer().close();
        let fin = push(&mut b);
        settle(&mut b, &mut a, fin);

        assert!(!b.active());
        assert!(a.active());
        a.tick(10 * RTO - 1, |_| panic!("nothing to send"));
        assert!(a.active());
        a.tick(1, |_| panic!("nothing to send"));
        assert!(!a.active());
    }

    #[test]
    #[tracing_test::traced_test]
    fn aborts_after_too_many_retransmissions() {
        let mut a = TcpPeer::new(TcpConfig {
            initial_rto_ms: RTO,
            max_retx_attempts: 2,
            ..Default::default()
        })
        .unwrap();
        push(&mut a);

        let mut sent = Vec::new();
        let mut elapsed = 0;
        while a.active() {
            a.tick(1, |s| sent.push(s));
            elapsed += 1;
            assert!(elapsed < 100 * RTO);
        }
        // Three retransmissions of the SYN, then the reset
        assert_eq!(sent.len(), 4);
        assert!(sent[..3].iter().all(|s| s.sender.syn));
        assert!(sent[3].is_reset());
        assert!(a.outbound_stream().has_error());
        assert!(a.inbound_stream().has_error());
        assert!(logs_contain("Too many retransmissions"));
    }

    #[test]
    fn reset_errors_both_streams() {
        let mut a = peer(1);
        let mut b = peer(2);
        let syn = push(&mut a);
        settle(&mut a, &mut b, syn);

        assert!(push(&mut b).is_empty());
        let mut reset = TcpSegment::new(b.sender().make_empty_message(), b.receiver().send());
        reset.sender.rst = true;

        a.receive(reset, |_| panic!("no reply to a reset"));
        assert!(!a.active());
        assert!(a.inbound_stream().has_error());
        assert!(a.outbound_stream().has_error());
    }
}
