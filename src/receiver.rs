//! The receiving half of a connection.
//!
//! ```text
//!     1          2          3
//! ----------|----------|----------
//!        ackno      ackno
//!                  +window
//!
//! 1 - old sequence numbers which have been acknowledged
//! 2 - sequence numbers allowed for new reception
//! 3 - future sequence numbers which are not yet allowed
//! ```

use crate::{
    byte_stream::{ByteStream, Reader},
    message::{ReceiverMessage, SenderMessage},
    Reassembler, Wrap32,
};
use tracing::{debug, trace, warn};

/// Turns inbound [`SenderMessage`]s into stream bytes, and reports what it
/// has received as a [`ReceiverMessage`].
#[derive(Debug, Clone)]
pub struct Receiver {
    reassembler: Reassembler,
    /// The sequence number of the peer's SYN, once seen
    isn: Option<Wrap32>,
}

impl Receiver {
    /// Creates a receiver that delivers bytes into `output`.
    pub fn new(output: ByteStream) -> Self {
        Self {
            reassembler: Reassembler::new(output),
            isn: None,
        }
    }

    /// Processes one inbound message.
    pub fn receive(&mut self, message: SenderMessage) {
        if message.rst {
            warn!("Connection reset by peer");
            self.reassembler.reader().set_error();
            return;
        }

        // The absolute index of the next expected sequence number
        let checkpoint = self.reassembler.output().bytes_pushed() + self.isn.is_some() as u64;

        let isn = match self.isn {
            Some(isn) => {
                if checkpoint <= u32::MAX as u64 && message.seqno == isn {
                    debug!(seqno = %message.seqno, "Discarding stale SYN");
                    return;
                }
                isn
            }
            None => {
                if !message.syn {
                    trace!(seqno = %message.seqno, "Discarding segment before SYN");
                    return;
                }
                debug!(isn = %message.seqno, "SYN received");
                self.isn = Some(message.seqno);
                message.seqno
            }
        };

        let absolute = message.seqno.unwrap(isn, checkpoint);
        // The SYN occupies absolute index zero, so stream index zero is the
        // first payload byte
        let first_index = absolute.saturating_sub(1);
        self.reassembler
            .insert(first_index, message.payload, message.fin);
    }

    /// The acknowledgment and window to report to the sender.
    pub fn send(&self) -> ReceiverMessage {
        let output = self.reassembler.output();
        let window_size = output.available_capacity().min(u16::MAX as u64) as u16;
        let ackno = self.isn.map(|isn| {
            // SYN, the bytes written so far, and FIN once the stream closes
            let next = 1 + output.bytes_pushed() + output.is_closed() as u64;
            Wrap32::wrap(next, isn)
        });
        ReceiverMessage {
            ackno,
            window_size,
            rst: output.has_error(),
        }
    }

    /// The reassembler that feeds the inbound stream.
    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// The read-side handle of the inbound stream.
    pub fn reader(&mut self) -> Reader<'_> {
        self.reassembler.reader()
    }

    /// The inbound stream, for inspection.
    pub fn stream(&self) -> &ByteStream {
        self.reassembler.output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISN: Wrap32 = Wrap32::new(5000);

    fn message(seqno: Wrap32, payload: &str) -> SenderMessage {
        SenderMessage {
            seqno,
            payload: payload.into(),
            ..Default::default()
        }
    }

    fn syn() -> SenderMessage {
        SenderMessage {
            syn: true,
            ..message(ISN, "")
        }
    }

    #[test]
    fn no_ackno_before_syn() {
        let mut receiver = Receiver::new(ByteStream::new(4000));
        assert_eq!(receiver.send().ackno, None);
        assert_eq!(receiver.send().window_size, 4000);

        receiver.receive(message(ISN + 1, "abc"));
        assert_eq!(receiver.send().ackno, None);
        assert_eq!(receiver.stream().bytes_pushed(), 0);
    }

    #[test]
    fn syn_then_data() {
        let mut receiver = Receiver::new(ByteStream::new(4000));
        receiver.receive(syn());
        assert_eq!(receiver.send().ackno, Some(ISN + 1));

        receiver.receive(message(ISN + 1, "abcd"));
        assert_eq!(receiver.send().ackno, Some(ISN + 5));
        assert_eq!(receiver.send().window_size, 3996);
        assert_eq!(receiver.reader().read_to_end(), b"abcd");
        assert_eq!(receiver.send().window_size, 4000);
    }

    #[test]
    fn syn_with_payload_and_fin() {
        let mut receiver = Receiver::new(ByteStream::new(4000));
        receiver.receive(SenderMessage {
            syn: true,
            fin: true,
            ..message(ISN, "Hello")
        });
        // SYN + 5 bytes + FIN
        assert_eq!(receiver.send().ackno, Some(ISN + 7));
        assert!(receiver.stream().is_closed());
    }

    #[test]
    fn stale_syn_is_ignored() {
        let mut receiver = Receiver::new(ByteStream::new(4000));
        receiver.receive(SenderMessage {
            syn: true,
            ..message(ISN, "ab")
        });
        receiver.receive(SenderMessage {
            syn: true,
            ..message(ISN, "xyz")
        });
        assert_eq!(receiver.send().ackno, Some(ISN + 3));
        assert_eq!(receiver.reader().read_to_end(), b"ab");
    }

    #[test]
    fn window_is_capped() {
        let receiver = Receiver::new(ByteStream::new(1 << 20));
        assert_eq!(receiver.send().window_size, u16::MAX);
    }

    #[test]
    fn reset_sets_error() {
        let mut receiver = Receiver::new(ByteStream::new(4000));
        receiver.receive(syn());
        receiver.receive(SenderMessage {
            rst: true,
            ..message(ISN + 1, "")
        });
        assert!(receiver.stream().has_error());
        assert!(receiver.send().rst);
    }
}
