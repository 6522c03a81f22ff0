//! The sending half of a connection.
//!
//! ```text
//!      1         2          3          4
//! ----------|----------|----------|----------
//!        acked      next       acked
//!                             +window
//!
//! 1 - old sequence numbers which have been acknowledged
//! 2 - sequence numbers of unacknowledged data
//! 3 - sequence numbers allowed for new data transmission (send window)
//! 4 - future sequence numbers which are not yet allowed
//! ```

use crate::{
    byte_stream::{ByteStream, Writer},
    config::MAX_PAYLOAD_SIZE,
    message::{ReceiverMessage, SenderMessage},
    Wrap32,
};
use std::collections::VecDeque;
use tracing::{debug, warn};

mod state;
pub use state::State;

mod timer;
pub use timer::RetransmissionTimer;

/// Turns the bytes of its input stream into [`SenderMessage`]s and
/// retransmits them until a [`ReceiverMessage`] acknowledges them.
#[derive(Debug, Clone)]
pub struct Sender {
    input: ByteStream,
    isn: Wrap32,
    initial_rto_ms: u64,
    max_payload_size: usize,
    /// The retransmission queue. Contains every sent message that is not yet
    /// fully acknowledged, in sending order.
    outstanding: VecDeque<SenderMessage>,
    /// Absolute sequence number of the next slot to be sent
    next_seqno: u64,
    /// Absolute sequence number of the oldest unacknowledged slot
    acked_seqno: u64,
    /// Sum of the sequence lengths of the outstanding messages
    in_flight: u64,
    /// The most recent window advertised by the receiver
    window_size: u16,
    syn_sent: bool,
    /// The input stream has finished, so FIN should be sent when it fits
    fin_pending: bool,
    fin_sent: bool,
    retransmissions: u64,
    timer: RetransmissionTimer,
}

impl Sender {
    /// Creates a sender that reads from `input` and numbers its stream
    /// starting from `isn`.
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64) -> Self {
        Self {
            input,
            isn,
            initial_rto_ms,
            max_payload_size: MAX_PAYLOAD_SIZE,
            outstanding: VecDeque::new(),
            next_seqno: 0,
            acked_seqno: 0,
            in_flight: 0,
            // Until the receiver speaks, assume room for the SYN alone
            window_size: 1,
            syn_sent: false,
            fin_pending: false,
            fin_sent: false,
            retransmissions: 0,
            timer: RetransmissionTimer::new(initial_rto_ms),
        }
    }

    /// Limits the payload of each message to `max_payload_size` bytes.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// Sends as much of the input stream as the receiver's window allows.
    pub fn push(&mut self, mut transmit: impl FnMut(&SenderMessage)) {
        self.fin_pending |= self.input.is_finished();

        if !self.syn_sent {
            // An input that finished before anything was sent closes in the
            // same message that opens
            self.syn_sent = true;
            self.fin_sent = self.fin_pending;
            let message = self.make_message(Vec::new(), true, self.fin_pending);
            self.send_new(message, &mut transmit);
            return;
        }

        if self.fin_sent {
            return;
        }

        // A zero window still admits a single probe
        let window = (self.window_size as u64).max(1);
        while self.in_flight < window && !self.fin_sent {
            let budget = window - self.in_flight;
            let limit = budget.min(self.max_payload_size as u64) as usize;
            let payload = self.read_payload(limit);
            self.fin_pending |= self.input.is_finished();

            if payload.is_empty() && !self.fin_pending {
                break;
            }

            // FIN needs a sequence slot of its own inside the window
            let fin = self.fin_pending && (payload.len() as u64) < budget;
            self.fin_sent = fin;
            let message = self.make_message(payload, false, fin);
            self.send_new(message, &mut transmit);
        }
    }

    /// Pops up to `limit` bytes from the input stream.
    fn read_payload(&mut self, limit: usize) -> Vec<u8> {
        let mut payload = Vec::new();
        let mut reader = self.input.reader();
        while payload.len() < limit {
            let front = reader.peek();
            if front.is_empty() {
                break;
            }
            let len = front.len().min(limit - payload.len());
            payload.extend_from_slice(&front[..len]);
            reader.pop(len as u64);
        }
        payload
    }

    fn send_new(&mut self, message: SenderMessage, transmit: &mut impl FnMut(&SenderMessage)) {
        let len = message.sequence_length();
        self.next_seqno += len;
        self.in_flight += len;
        if len > 0 {
            self.timer.activate();
        }
        transmit(&message);
        self.outstanding.push_back(message);
    }

    fn make_message(&self, payload: Vec<u8>, syn: bool, fin: bool) -> SenderMessage {
        SenderMessage {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            syn,
            payload,
            fin,
            rst: self.input.has_error(),
        }
    }

    /// A message that occupies no sequence numbers, for carrying an
    /// acknowledgment when there is nothing else to send.
    pub fn make_empty_message(&self) -> SenderMessage {
        self.make_message(Vec::new(), false, false)
    }

    /// Processes an acknowledgment and window update from the receiver.
    pub fn receive(&mut self, message: &ReceiverMessage) {
        if message.rst {
            warn!("Connection reset by peer");
            self.input.writer().set_error();
            return;
        }

        let Some(ackno) = message.ackno else {
            if message.window_size == 0 {
                warn!("Peer advertised a zero window without an ackno");
                self.input.writer().set_error();
            }
            return;
        };

        let expected = ackno.unwrap(self.isn, self.next_seqno);
        if expected > self.next_seqno {
            debug!(
                %ackno,
                expected,
                next = self.next_seqno,
                "Ignoring acknowledgment of unsent data"
            );
            return;
        }

        self.window_size = message.window_size;

        // Only whole messages leave the queue
        let mut acknowledged = false;
        while let Some(front) = self.outstanding.front() {
            let front_len = front.sequence_length();
            let end = self.acked_seqno + front_len;
            if expected < end {
                break;
            }
            self.acked_seqno = end;
            self.in_flight -= front_len;
            self.outstanding.pop_front();
            acknowledged = true;
        }

        if acknowledged {
            self.timer = RetransmissionTimer::new(self.initial_rto_ms);
            if !self.outstanding.is_empty() {
                self.timer.activate();
            }
            self.retransmissions = 0;
        }
    }

    /// Advances the retransmission timer, resending the oldest outstanding
    /// message if it expires.
    pub fn tick(&mut self, ms_since_last_tick: u64, mut transmit: impl FnMut(&SenderMessage)) {
        self.timer.tick(ms_since_last_tick);
        if !self.timer.is_expired() {
            return;
        }

        let Some(front) = self.outstanding.front() else {
            self.timer = RetransmissionTimer::new(self.initial_rto_ms);
            return;
        };

        debug!(
            seqno = %front.seqno,
            rto_ms = self.timer.rto_ms(),
            attempt = self.retransmissions + 1,
            "Retransmitting"
        );
        transmit(front);

        // Probing a zero window is not a sign of congestion
        if self.window_size > 0 {
            self.timer.back_off();
        }
        self.timer.reset();
        self.retransmissions += 1;
    }

    /// How many sequence numbers are outstanding.
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.in_flight
    }

    /// How many consecutive retransmissions have happened since the last
    /// acknowledgment of new data.
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.retransmissions
    }

    /// Where the sender is in the life of its stream.
    pub fn state(&self) -> State {
        if !self.syn_sent {
            State::Idle
        } else if self.fin_sent {
            State::FinSent
        } else if self.acked_seqno == 0 {
            State::SynSent
        } else {
            State::Established
        }
    }

    /// Whether FIN has been sent and every sequence number acknowledged.
    pub fn is_finished(&self) -> bool {
        self.fin_sent && self.outstanding.is_empty()
    }

    /// The timeout the retransmission timer currently waits for.
    pub fn current_rto_ms(&self) -> u64 {
        self.timer.rto_ms()
    }

    /// The write-side handle of the outbound stream.
    pub fn writer(&mut self) -> Writer<'_> {
        self.input.writer()
    }

    /// The outbound stream, for inspection.
    pub fn stream(&self) -> &ByteStream {
        &self.input
    }
}
