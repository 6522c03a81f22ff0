//! The messages exchanged by the two halves of a connection.
//!
//! A [`SenderMessage`] carries stream bytes from a sender to a receiver. A
//! [`ReceiverMessage`] carries the acknowledgment and window back. A
//! [`TcpSegment`] bundles one of each, which is what a bidirectional peer puts
//! on the wire.

use crate::Wrap32;

mod tcp_parsing;
pub use tcp_parsing::{Control, ParseError, ParsedSegment};

/// The sender's half of a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderMessage {
    /// The sequence number of the first sequence slot this message occupies.
    /// If SYN is present this is the initial sequence number and the first
    /// payload byte is ISN+1.
    pub seqno: Wrap32,
    /// Whether this message begins the stream
    pub syn: bool,
    /// The stream bytes carried by the message
    pub payload: Vec<u8>,
    /// Whether this message ends the stream
    pub fin: bool,
    /// Whether the sending stream has failed
    pub rst: bool,
}

impl SenderMessage {
    /// The number of sequence slots the message occupies. SYN and FIN each
    /// take one slot in addition to the payload bytes.
    pub fn sequence_length(&self) -> u64 {
        self.syn as u64 + self.payload.len() as u64 + self.fin as u64
    }
}

/// The receiver's half of a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverMessage {
    /// The next sequence number the receiver expects, once it knows the ISN
    pub ackno: Option<Wrap32>,
    /// How many sequence numbers past `ackno` the receiver will accept
    pub window_size: u16,
    /// Whether the receiving stream has failed
    pub rst: bool,
}

/// A full segment as exchanged between two peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TcpSegment {
    pub sender: SenderMessage,
    pub receiver: ReceiverMessage,
}

impl TcpSegment {
    pub fn new(sender: SenderMessage, receiver: ReceiverMessage) -> Self {
        Self { sender, receiver }
    }

    /// Whether either half signals a reset.
    pub fn is_reset(&self) -> bool {
        self.sender.rst || self.receiver.rst
    }
}
