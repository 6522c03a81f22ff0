use super::{ReceiverMessage, SenderMessage, TcpSegment};
use crate::Wrap32;
use thiserror::Error as ThisError;

/// The number of 32-bit words in a TCP header without optional header parts
const BASE_HEADER_WORDS: u8 = 5;
/// The number of bytes in a TCP header without optional header parts
const BASE_HEADER_OCTETS: usize = BASE_HEADER_WORDS as usize * 4;

/// A segment decoded from the wire, along with the ports it was addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSegment {
    /// The source port number
    pub src_port: u16,
    /// The destination port number
    pub dst_port: u16,
    pub segment: TcpSegment,
}

impl TcpSegment {
    /// Convert the segment to its native serialized format, ready to hand to
    /// the network layer. The checksum and urgent pointer are left zero.
    pub fn serialize(&self, src_port: u16, dst_port: u16) -> Vec<u8> {
        let ctl = Control::new(
            self.receiver.ackno.is_some(),
            self.is_reset(),
            self.sender.syn,
            self.sender.fin,
        );
        let ack = self.receiver.ackno.map(Wrap32::raw).unwrap_or(0);

        let mut out = Vec::with_capacity(BASE_HEADER_OCTETS + self.sender.payload.len());
        out.extend_from_slice(&src_port.to_be_bytes());
        out.extend_from_slice(&dst_port.to_be_bytes());
        out.extend_from_slice(&self.sender.seqno.raw().to_be_bytes());
        out.extend_from_slice(&ack.to_be_bytes());
        out.push(BASE_HEADER_WORDS << 4);
        out.push(ctl.into());
        out.extend_from_slice(&self.receiver.window_size.to_be_bytes());
        // Checksum
        out.extend_from_slice(&[0, 0]);
        // Urgent pointer
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&self.sender.payload);
        out
    }

    /// Parses a serialized segment into its constituent fields. The checksum
    /// field is not verified.
    pub fn parse(packet: &[u8]) -> Result<ParsedSegment, ParseError> {
        if packet.len() < BASE_HEADER_OCTETS {
            Err(ParseError::HeaderTooShort)?
        }

        let u16_at = |i: usize| u16::from_be_bytes([packet[i], packet[i + 1]]);
        let u32_at =
            |i: usize| u32::from_be_bytes([packet[i], packet[i + 1], packet[i + 2], packet[i + 3]]);

        let src_port = u16_at(0);
        let dst_port = u16_at(2);
        let seq = u32_at(4);
        let ack = u32_at(8);
        let data_offset = packet[12] >> 4;
        let ctl = Control::from(packet[13]);
        let wnd = u16_at(14);

        if data_offset != BASE_HEADER_WORDS {
            // TODO: Accept and skip header options
            Err(ParseError::UnexpectedOptions(data_offset))?
        }

        let sender = SenderMessage {
            seqno: Wrap32::new(seq),
            syn: ctl.syn(),
            payload: packet[BASE_HEADER_OCTETS..].to_vec(),
            fin: ctl.fin(),
            rst: ctl.rst(),
        };
        let receiver = ReceiverMessage {
            ackno: ctl.ack().then_some(Wrap32::new(ack)),
            window_size: wnd,
            rst: ctl.rst(),
        };

        Ok(ParsedSegment {
            src_port,
            dst_port,
            segment: TcpSegment::new(sender, receiver),
        })
    }
}

/// An error that occurred while parsing a TCP header
#[derive(Debug, ThisError, PartialEq, Eq, Clone, Copy)]
pub enum ParseError {
    #[error("Too few bytes to constitute a TCP header")]
    HeaderTooShort,
    #[error("Data offset {0} was different from that expected for a simple header")]
    UnexpectedOptions(u8),
}

/// The control bits of a TCP header. Only the bits this engine acts on have
/// accessors; URG and PSH are ignored on input and never set on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Control(u8);

impl Control {
    /// Create a new Control with the given bits
    pub const fn new(ack: bool, rst: bool, syn: bool, fin: bool) -> Self {
        Self(fin as u8 | (syn as u8) << 1 | (rst as u8) << 2 | (ack as u8) << 4)
    }

    /// Get whether the acknowledgment field is significant
    pub const fn ack(self) -> bool {
        self.bit(4)
    }

    /// Get whether to reset the connection
    pub const fn rst(self) -> bool {
        self.bit(2)
    }

    /// Get whether to synchronize sequence numbers
    pub const fn syn(self) -> bool {
        self.bit(1)
    }

    /// Get whether this is the last data from the sender
    pub const fn fin(self) -> bool {
        self.bit(0)
    }

    const fn bit(self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }
}

impl From<u8> for Control {
    fn from(value: u8) -> Self {
        Self(value & 0b11_1111)
    }
}

impl From<Control> for u8 {
    fn from(control: Control) -> Self {
        control.0
    }
}
